//! On-disk layout constants (spec.md §4.7). All multi-byte fields are
//! little-endian; lengths are 32-bit.

pub const MAGIC: [u8; 4] = *b"YMET";
pub const VERSION: u8 = 1;

pub const TAG_START_OF_FILE: u8 = 0x01;
pub const TAG_DEFINES: u8 = 0x02;
pub const TAG_INCLUDES: u8 = 0x03;
pub const TAG_SECTIONS: u8 = 0x04;
pub const TAG_SECTION_START: u8 = 0x05;
pub const TAG_DYNAMIC_STATE: u8 = 0x06;
pub const TAG_END_OF_FILE: u8 = 0x07;

pub const VALUE_NULL: u8 = 0x00;
pub const VALUE_BOOL: u8 = 0x01;
pub const VALUE_INT64: u8 = 0x02;
pub const VALUE_FLOAT64: u8 = 0x03;
pub const VALUE_STRING: u8 = 0x04;
pub const VALUE_ARRAY: u8 = 0x05;
pub const VALUE_SET: u8 = 0x06;
pub const VALUE_MAP: u8 = 0x07;
pub const VALUE_COLOR: u8 = 0x08;
pub const VALUE_COORD: u8 = 0x09;
pub const VALUE_PATH: u8 = 0x0a;
pub const VALUE_DYNAMIC: u8 = 0x0b;
