use std::io::Write;

use invaders_core::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Bytes per video RAM column (256 vertical pixels, 1 bit each).
const BYTES_PER_COLUMN: usize = SCREEN_HEIGHT / 8;

/// Is the pixel at upright screen position (`x`, `y`) lit?
///
/// Video RAM stores the monitor sideways: each 32-byte run is one column
/// from the bottom of the screen up, least significant bit first. The
/// cabinet rotates the monitor a quarter turn counter-clockwise.
pub fn pixel(vram: &[u8], x: usize, y: usize) -> bool {
    let bit_y = SCREEN_HEIGHT - 1 - y;
    let byte = vram[x * BYTES_PER_COLUMN + bit_y / 8];
    byte & (1 << (bit_y % 8)) != 0
}

/// Write the upright frame as a binary PBM (P4). Lit pixels are written as 1.
pub fn write_pbm<W: Write>(out: &mut W, vram: &[u8]) -> std::io::Result<()> {
    write!(out, "P4\n{SCREEN_WIDTH} {SCREEN_HEIGHT}\n")?;

    let row_bytes = SCREEN_WIDTH.div_ceil(8);
    let mut row = vec![0u8; row_bytes];
    for y in 0..SCREEN_HEIGHT {
        row.fill(0);
        for x in 0..SCREEN_WIDTH {
            if pixel(vram, x, y) {
                row[x / 8] |= 0x80 >> (x % 8);
            }
        }
        out.write_all(&row)?;
    }
    Ok(())
}
