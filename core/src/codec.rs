//! Compact level tokens for the address fragment.
//!
//! A token is an MSB-first bit stream written six bits per symbol:
//!
//! | field            | bits                        |
//! |------------------|-----------------------------|
//! | height - 1       | 4                           |
//! | width - 1        | 4                           |
//! | endpoint count   | 5                           |
//! | per endpoint     | 3 (color id - 1) + index    |
//!
//! where the index width is `ceil(log2(height * width))`. Padding bits in the
//! last symbol are zero. The alphabet only holds unreserved URI characters and
//! leaves out `-`, so a token never reads as a command line flag.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::*;

pub const ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz._";

const SYMBOL_BITS: u32 = 6;
const SIDE_BITS: u32 = 4;
const COUNT_BITS: u32 = 5;
const COLOR_BITS: u32 = 3;
const HEADER_BITS: u32 = 2 * SIDE_BITS + COUNT_BITS;

/// Bits needed to address any cell of a grid with `total_cells` cells.
const fn index_bits(total_cells: CellIndex) -> u32 {
    CellIndex::BITS - total_cells.saturating_sub(1).leading_zeros()
}

const fn symbol_value(symbol: u8) -> Option<u32> {
    let value = match symbol {
        b'0'..=b'9' => symbol - b'0',
        b'A'..=b'Z' => symbol - b'A' + 10,
        b'a'..=b'z' => symbol - b'a' + 36,
        b'.' => 62,
        b'_' => 63,
        _ => return None,
    };
    Some(value as u32)
}

/// Number of symbols [`encode`] produces for `level`.
pub fn token_len(level: &Level) -> usize {
    let per_endpoint = COLOR_BITS + index_bits(level.total_cells());
    let bits = HEADER_BITS as usize + level.endpoints().len() * per_endpoint as usize;
    bits.div_ceil(SYMBOL_BITS as usize)
}

pub fn encode(level: &Level) -> String {
    let index_bits = index_bits(level.total_cells());
    let mut writer = BitWriter::with_capacity(token_len(level));

    writer.push(u32::from(level.height() - 1), SIDE_BITS);
    writer.push(u32::from(level.width() - 1), SIDE_BITS);
    writer.push(level.endpoints().len() as u32, COUNT_BITS);
    for endpoint in level.endpoints() {
        writer.push(u32::from(endpoint.color.id() - 1), COLOR_BITS);
        writer.push(u32::from(endpoint.cell), index_bits);
    }

    writer.finish()
}

pub fn decode(token: &str) -> Result<Level, DecodeError> {
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }
    if let Some((position, symbol)) = token
        .chars()
        .enumerate()
        .find(|&(_, symbol)| !symbol.is_ascii() || symbol_value(symbol as u8).is_none())
    {
        return Err(DecodeError::InvalidSymbol { position, symbol });
    }

    let mut reader = BitReader::new(token.as_bytes());
    let height = reader.read(SIDE_BITS)? as Coord + 1;
    let width = reader.read(SIDE_BITS)? as Coord + 1;
    let count = reader.read(COUNT_BITS)? as usize;
    let index_bits = index_bits(mult(height, width));

    let endpoints = (0..count)
        .map(|_| -> Result<Endpoint, DecodeError> {
            let color = Color::from_id(reader.read(COLOR_BITS)? as u8 + 1).unwrap_or_default();
            let cell = reader.read(index_bits)? as CellIndex;
            Ok(Endpoint::new(cell, color))
        })
        .collect::<Result<Vec<_>, DecodeError>>()?;
    reader.finish()?;

    Ok(Level::new(height, width, endpoints)?)
}

impl FromStr for Level {
    type Err = DecodeError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        decode(token)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

#[derive(Debug, Default)]
struct BitWriter {
    symbols: String,
    acc: u32,
    len: u32,
}

impl BitWriter {
    fn with_capacity(symbols: usize) -> Self {
        Self {
            symbols: String::with_capacity(symbols),
            ..Default::default()
        }
    }

    fn push(&mut self, value: u32, bits: u32) {
        for shift in (0..bits).rev() {
            self.acc = (self.acc << 1) | ((value >> shift) & 1);
            self.len += 1;
            if self.len == SYMBOL_BITS {
                self.flush();
            }
        }
    }

    fn flush(&mut self) {
        self.symbols.push(char::from(ALPHABET[self.acc as usize]));
        self.acc = 0;
        self.len = 0;
    }

    fn finish(mut self) -> String {
        if self.len > 0 {
            self.acc <<= SYMBOL_BITS - self.len;
            self.flush();
        }
        self.symbols
    }
}

/// Reads bits back out of a token whose symbols were already checked.
#[derive(Debug)]
struct BitReader<'a> {
    symbols: &'a [u8],
    position: usize,
    acc: u32,
    len: u32,
}

impl<'a> BitReader<'a> {
    fn new(symbols: &'a [u8]) -> Self {
        Self {
            symbols,
            position: 0,
            acc: 0,
            len: 0,
        }
    }

    fn read(&mut self, bits: u32) -> Result<u32, DecodeError> {
        let mut value = 0;
        for _ in 0..bits {
            if self.len == 0 {
                let symbol = *self
                    .symbols
                    .get(self.position)
                    .ok_or(DecodeError::Truncated)?;
                self.acc = symbol_value(symbol).ok_or(DecodeError::InvalidSymbol {
                    position: self.position,
                    symbol: char::from(symbol),
                })?;
                self.position += 1;
                self.len = SYMBOL_BITS;
            }
            self.len -= 1;
            value = (value << 1) | ((self.acc >> self.len) & 1);
        }
        Ok(value)
    }

    fn finish(self) -> Result<(), DecodeError> {
        let padding = self.acc & ((1 << self.len) - 1);
        if self.position < self.symbols.len() || padding != 0 {
            Err(DecodeError::TrailingData)
        } else {
            Ok(())
        }
    }
}
