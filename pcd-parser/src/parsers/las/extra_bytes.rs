//! Decoding of LAS "extra bytes" attributes (LASF_Spec VLR, record id 4).

use byteorder::{ByteOrder as _, LittleEndian};
use las::Vlr;

use crate::error::ParseError;

pub const EXTRA_BYTES_USER_ID: &str = "LASF_Spec";
pub const EXTRA_BYTES_RECORD_ID: u16 = 4;
pub const DESCRIPTOR_SIZE: usize = 192;

const OPTION_SCALE: u8 = 0x08;
const OPTION_OFFSET: u8 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraBytesType {
    /// Opaque bytes, the descriptor's `options` field holds the width.
    Undocumented(usize),
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    /// Deprecated two- and three-element array types.
    Array { element: u8, count: usize },
}

impl ExtraBytesType {
    fn from_descriptor(data_type: u8, options: u8) -> Result<Self, ParseError> {
        let ty = match data_type {
            0 => ExtraBytesType::Undocumented(options as usize),
            1 => ExtraBytesType::U8,
            2 => ExtraBytesType::I8,
            3 => ExtraBytesType::U16,
            4 => ExtraBytesType::I16,
            5 => ExtraBytesType::U32,
            6 => ExtraBytesType::I32,
            7 => ExtraBytesType::U64,
            8 => ExtraBytesType::I64,
            9 => ExtraBytesType::F32,
            10 => ExtraBytesType::F64,
            11..=30 => ExtraBytesType::Array {
                element: (data_type - 1) % 10 + 1,
                count: ((data_type - 1) / 10 + 1) as usize,
            },
            other => {
                return Err(ParseError::ExtraBytes(format!(
                    "unknown data type {}",
                    other
                )))
            }
        };
        Ok(ty)
    }

    pub fn size(&self) -> usize {
        match self {
            ExtraBytesType::Undocumented(size) => *size,
            ExtraBytesType::U8 | ExtraBytesType::I8 => 1,
            ExtraBytesType::U16 | ExtraBytesType::I16 => 2,
            ExtraBytesType::U32 | ExtraBytesType::I32 | ExtraBytesType::F32 => 4,
            ExtraBytesType::U64 | ExtraBytesType::I64 | ExtraBytesType::F64 => 8,
            ExtraBytesType::Array { element, count } => {
                let element_size = match element {
                    1 | 2 => 1,
                    3 | 4 => 2,
                    5 | 6 | 9 => 4,
                    _ => 8,
                };
                element_size * count
            }
        }
    }

    fn is_scalar(&self) -> bool {
        !matches!(
            self,
            ExtraBytesType::Undocumented(_) | ExtraBytesType::Array { .. }
        )
    }
}

/// One named attribute stored in each point's extra bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraBytesField {
    pub name: String,
    pub data_type: ExtraBytesType,
    /// Byte offset inside the point's extra bytes.
    pub offset: usize,
    pub scale: Option<f64>,
    pub value_offset: Option<f64>,
}

impl ExtraBytesField {
    /// Decodes the raw value and applies scale and offset.
    pub fn read_f64(&self, extra_bytes: &[u8]) -> Option<f64> {
        if !self.data_type.is_scalar() {
            return None;
        }
        let bytes = extra_bytes.get(self.offset..self.offset + self.data_type.size())?;
        let raw = match self.data_type {
            ExtraBytesType::U8 => bytes[0] as f64,
            ExtraBytesType::I8 => bytes[0] as i8 as f64,
            ExtraBytesType::U16 => LittleEndian::read_u16(bytes) as f64,
            ExtraBytesType::I16 => LittleEndian::read_i16(bytes) as f64,
            ExtraBytesType::U32 => LittleEndian::read_u32(bytes) as f64,
            ExtraBytesType::I32 => LittleEndian::read_i32(bytes) as f64,
            ExtraBytesType::U64 => LittleEndian::read_u64(bytes) as f64,
            ExtraBytesType::I64 => LittleEndian::read_i64(bytes) as f64,
            ExtraBytesType::F32 => LittleEndian::read_f32(bytes) as f64,
            ExtraBytesType::F64 => LittleEndian::read_f64(bytes),
            ExtraBytesType::Undocumented(_) | ExtraBytesType::Array { .. } => return None,
        };
        Some(raw * self.scale.unwrap_or(1.0) + self.value_offset.unwrap_or(0.0))
    }

    pub fn read_id(&self, extra_bytes: &[u8]) -> Option<i64> {
        let value = self.read_f64(extra_bytes)?;
        value.is_finite().then(|| value.round() as i64)
    }
}

/// Decodes the descriptors of an extra-bytes VLR payload.
pub fn parse_descriptors(data: &[u8]) -> Result<Vec<ExtraBytesField>, ParseError> {
    if data.len() % DESCRIPTOR_SIZE != 0 {
        return Err(ParseError::ExtraBytes(format!(
            "payload of {} bytes is not a multiple of {}",
            data.len(),
            DESCRIPTOR_SIZE
        )));
    }

    let mut fields = Vec::new();
    let mut offset = 0;
    for descriptor in data.chunks_exact(DESCRIPTOR_SIZE) {
        let data_type = ExtraBytesType::from_descriptor(descriptor[2], descriptor[3])?;
        let options = descriptor[3];
        let name = String::from_utf8_lossy(&descriptor[4..36])
            .trim_end_matches('\0')
            .trim()
            .to_string();

        let scale = (data_type.is_scalar() && options & OPTION_SCALE != 0)
            .then(|| LittleEndian::read_f64(&descriptor[112..120]));
        let value_offset = (data_type.is_scalar() && options & OPTION_OFFSET != 0)
            .then(|| LittleEndian::read_f64(&descriptor[136..144]));

        let size = data_type.size();
        fields.push(ExtraBytesField {
            name,
            data_type,
            offset,
            scale,
            value_offset,
        });
        offset += size;
    }

    Ok(fields)
}

/// Collects the extra-bytes fields declared in the given (E)VLRs.
pub fn extra_bytes_fields<'a, I>(vlrs: I) -> Result<Vec<ExtraBytesField>, ParseError>
where
    I: IntoIterator<Item = &'a Vlr>,
{
    let mut fields = Vec::new();
    for vlr in vlrs {
        if vlr.user_id == EXTRA_BYTES_USER_ID && vlr.record_id == EXTRA_BYTES_RECORD_ID {
            fields.extend(parse_descriptors(&vlr.data)?);
        }
    }
    Ok(fields)
}

#[cfg(test)]
pub(crate) fn descriptor(
    name: &str,
    data_type: u8,
    options: u8,
    scale: f64,
    offset: f64,
) -> Vec<u8> {
    let mut d = vec![0u8; DESCRIPTOR_SIZE];
    d[2] = data_type;
    d[3] = options;
    d[4..4 + name.len()].copy_from_slice(name.as_bytes());
    LittleEndian::write_f64(&mut d[112..120], scale);
    LittleEndian::write_f64(&mut d[136..144], offset);
    d
}
