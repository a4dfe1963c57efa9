//! Parser for SPICE rawfiles.
//!
//! ngspice and LTspice both write simulation data in the "rawfile" format: a
//! text header followed by either ASCII (`Values:`) or binary (`Binary:`)
//! data. ngspice writes the header as UTF-8; LTspice writes it as UTF-16LE.
//!
//! Header fields:
//! - Title: simulation title
//! - Plotname: type of analysis
//! - Flags: real or complex (LTspice adds `forward`, `log`, `double`)
//! - No. Variables: number of data columns
//! - No. Points: number of data rows
//! - Variables: list of variable names and types
//! - Values: (ASCII) or Binary: (binary) marker before data

use crate::error::{Error, Result};
use crate::simulator::types::{RawVariable, RawfileData, RawfileHeader};

/// Text encoding of the header (and of ASCII data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextEncoding {
    Utf8,
    Utf16Le,
}

impl TextEncoding {
    /// LTspice headers start with `T\0i\0t\0...`.
    fn detect(data: &[u8]) -> Self {
        if data.len() >= 2 && data[0] != 0 && data[1] == 0 {
            TextEncoding::Utf16Le
        } else {
            TextEncoding::Utf8
        }
    }

    fn unit_width(self) -> usize {
        match self {
            TextEncoding::Utf8 => 1,
            TextEncoding::Utf16Le => 2,
        }
    }

    fn decode(self, units: &[u16]) -> String {
        match self {
            TextEncoding::Utf8 => {
                let bytes: Vec<u8> = units.iter().map(|&u| u as u8).collect();
                String::from_utf8_lossy(&bytes).into_owned()
            }
            TextEncoding::Utf16Le => String::from_utf16_lossy(units),
        }
    }

    fn decode_bytes(self, data: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(data).into_owned(),
            TextEncoding::Utf16Le => {
                let units: Vec<u16> = data
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }
}

/// Parse a rawfile from bytes.
pub fn parse_rawfile(data: &[u8]) -> Result<RawfileData> {
    let encoding = TextEncoding::detect(data);
    let (header_text, data_offset) = split_header(data, encoding)?;

    let mut header = parse_header(&header_text)?;
    if encoding == TextEncoding::Utf16Le {
        header.is_ltspice = true;
    }

    let body = &data[data_offset..];
    if header.is_binary {
        parse_binary_data(body, &header)
    } else {
        parse_ascii_data(&encoding.decode_bytes(body), &header)
    }
}

/// Decode the header up to and including the data marker line.
///
/// Returns the header text and the byte offset where data begins.
fn split_header(data: &[u8], encoding: TextEncoding) -> Result<(String, usize)> {
    let width = encoding.unit_width();
    let mut header = String::new();
    let mut line: Vec<u16> = Vec::new();
    let mut pos = 0;

    while pos + width <= data.len() {
        let unit = match encoding {
            TextEncoding::Utf8 => u16::from(data[pos]),
            TextEncoding::Utf16Le => u16::from_le_bytes([data[pos], data[pos + 1]]),
        };
        pos += width;

        if unit != u16::from(b'\n') {
            line.push(unit);
            continue;
        }

        let text = encoding.decode(&line);
        let marker = text.trim();
        header.push_str(&text);
        header.push('\n');
        line.clear();

        if marker.eq_ignore_ascii_case("Binary:") || marker.eq_ignore_ascii_case("Values:") {
            return Ok((header, pos));
        }
    }

    Err(Error::RawfileParseError(
        "no Binary: or Values: marker found".to_string(),
    ))
}

/// Parse the header section of the rawfile.
fn parse_header(data: &str) -> Result<RawfileHeader> {
    let mut title = String::new();
    let mut plotname = String::new();
    let mut flags = String::new();
    let mut num_variables = 0usize;
    let mut num_points = 0usize;
    let mut variables = Vec::new();
    let mut is_binary = false;
    let mut is_ltspice = false;
    let mut in_variables = false;

    for line in data.lines() {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("Title:") {
            title = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Plotname:") {
            plotname = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Flags:") {
            flags = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("No. Variables:") {
            let val = rest.trim();
            num_variables = val.parse().map_err(|_| {
                Error::RawfileParseError(format!("invalid No. Variables: {}", val))
            })?;
        } else if let Some(rest) = line.strip_prefix("No. Points:") {
            let val = rest.trim();
            num_points = val
                .parse()
                .map_err(|_| Error::RawfileParseError(format!("invalid No. Points: {}", val)))?;
        } else if let Some(rest) = line.strip_prefix("Command:") {
            is_ltspice = rest.to_lowercase().contains("ltspice");
        } else if line.starts_with("Variables:") {
            in_variables = true;
        } else if line.starts_with("Values:") || line.starts_with("Binary:") {
            is_binary = line.starts_with("Binary:");
            break;
        } else if in_variables && !line.is_empty() {
            // Variable line: "index name type [extra fields]"
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                let index: usize = parts[0].parse().map_err(|_| {
                    Error::RawfileParseError(format!("invalid variable index: {}", parts[0]))
                })?;
                variables.push(RawVariable {
                    index,
                    name: parts[1].to_string(),
                    var_type: parts[2].to_string(),
                });
            }
        }
    }

    if num_variables == 0 {
        return Err(Error::RawfileParseError("rawfile declares no variables".to_string()));
    }
    if variables.len() != num_variables {
        return Err(Error::RawfileParseError(format!(
            "header declares {} variables but lists {}",
            num_variables,
            variables.len()
        )));
    }
    if let Some(bad) = variables.iter().find(|v| v.index >= num_variables) {
        return Err(Error::RawfileParseError(format!(
            "variable index {} out of range",
            bad.index
        )));
    }

    let is_complex = flags.to_lowercase().contains("complex");

    Ok(RawfileHeader {
        title,
        plotname,
        flags,
        num_variables,
        num_points,
        variables,
        is_complex,
        is_binary,
        is_ltspice,
    })
}

/// Parse ASCII format data section.
///
/// Each point is a block starting with the point index, followed by one
/// value per variable. The first value may share the index line.
fn parse_ascii_data(data: &str, header: &RawfileHeader) -> Result<RawfileData> {
    let mut real_data: Vec<Vec<f64>> = Vec::with_capacity(header.num_points);
    let mut imag_data: Vec<Vec<f64>> = Vec::new();

    let mut point_real: Vec<f64> = Vec::with_capacity(header.num_variables);
    let mut point_imag: Vec<f64> = Vec::with_capacity(header.num_variables);
    let mut expecting_index = true;

    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value_str = if expecting_index {
            let mut parts = line.split_whitespace();
            let index = parts.next().unwrap_or_default();
            if index.parse::<usize>().is_err() {
                // Start of a following plot, or trailing garbage.
                break;
            }
            expecting_index = false;
            match parts.next() {
                Some(v) => v,
                None => continue,
            }
        } else {
            line
        };

        let (re, im) = parse_complex_value(value_str).ok_or_else(|| {
            Error::RawfileParseError(format!(
                "invalid value '{}' at point {}",
                value_str,
                real_data.len()
            ))
        })?;
        point_real.push(re);
        point_imag.push(im);

        if point_real.len() == header.num_variables {
            real_data.push(std::mem::take(&mut point_real));
            if header.is_complex {
                imag_data.push(std::mem::take(&mut point_imag));
            } else {
                point_imag.clear();
            }
            expecting_index = true;

            if header.num_points > 0 && real_data.len() == header.num_points {
                break;
            }
        }
    }

    if real_data.len() < header.num_points {
        log::warn!(
            "rawfile truncated: expected {} points, found {}",
            header.num_points,
            real_data.len()
        );
    }

    Ok(RawfileData {
        header: header.clone(),
        real_data,
        imag_data: header.is_complex.then_some(imag_data),
    })
}

/// Parse a complex value: "real,imag", "real, imag" or a bare real.
fn parse_complex_value(s: &str) -> Option<(f64, f64)> {
    let s = s.trim();
    match s.split_once(',') {
        Some((re, im)) => {
            let re = re.trim().parse::<f64>().ok()?;
            let im = im.trim().parse::<f64>().ok()?;
            Some((re, im))
        }
        None => s.parse::<f64>().ok().map(|v| (v, 0.0)),
    }
}

/// Parse binary format data section (little-endian).
fn parse_binary_data(data: &[u8], header: &RawfileHeader) -> Result<RawfileData> {
    let widths = header.binary_widths();
    let bytes_per_point: usize = widths.iter().sum();
    if bytes_per_point == 0 {
        return Err(Error::UnsupportedRawfileFormat(
            "zero-width binary points".to_string(),
        ));
    }

    let available = data.len() / bytes_per_point;
    let num_points = if header.num_points == 0 {
        available
    } else {
        header.num_points.min(available)
    };
    if num_points < header.num_points {
        log::warn!(
            "rawfile truncated: expected {} points, found {}",
            header.num_points,
            num_points
        );
    }

    let mut real_data: Vec<Vec<f64>> = Vec::with_capacity(num_points);
    let mut imag_data: Vec<Vec<f64>> = Vec::new();

    for point in data.chunks_exact(bytes_per_point).take(num_points) {
        let mut point_real = Vec::with_capacity(header.num_variables);
        let mut point_imag = Vec::with_capacity(header.num_variables);
        let mut offset = 0;

        for &width in &widths {
            let field = &point[offset..offset + width];
            match width {
                16 => {
                    point_real.push(read_f64_le(&field[..8]));
                    point_imag.push(read_f64_le(&field[8..]));
                }
                8 => point_real.push(read_f64_le(field)),
                _ => point_real.push(f64::from(read_f32_le(field))),
            }
            offset += width;
        }

        real_data.push(point_real);
        if header.is_complex {
            imag_data.push(point_imag);
        }
    }

    Ok(RawfileData {
        header: header.clone(),
        real_data,
        imag_data: header.is_complex.then_some(imag_data),
    })
}

/// Read a little-endian f64 from bytes.
fn read_f64_le(data: &[u8]) -> f64 {
    let bytes: [u8; 8] = data.get(..8).and_then(|b| b.try_into().ok()).unwrap_or([0; 8]);
    f64::from_le_bytes(bytes)
}

/// Read a little-endian f32 from bytes.
fn read_f32_le(data: &[u8]) -> f32 {
    let bytes: [u8; 4] = data.get(..4).and_then(|b| b.try_into().ok()).unwrap_or([0; 4]);
    f32::from_le_bytes(bytes)
}
