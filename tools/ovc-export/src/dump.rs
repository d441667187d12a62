//! Text dump of codec input face sets
//!
//! One file per geometry encode. Each section starts with
//! `name<TAB>slot<TAB>count<TAB>dim`, followed by one `[i]<TAB>` row per element.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use ovc_codec::{IndexedFaceSet, Slot};

/// Write `<dir>/<index>.txt`, creating `dir` if needed
pub fn dump_face_set(dir: &Path, index: usize, ifs: &IndexedFaceSet<'_>) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.txt", index));
    let mut out = BufWriter::new(File::create(&path)?);
    write_face_set(&mut out, ifs)?;
    out.flush()?;
    Ok(path)
}

pub fn write_face_set<W: Write>(out: &mut W, ifs: &IndexedFaceSet<'_>) -> io::Result<()> {
    write_section(out, "* CoordIndex", 0, Some(ifs.coord_index), ifs.triangle_count(), 3)?;
    write_section(out, "* MatID", 0, Some(ifs.index_buffer_ids), ifs.index_buffer_ids.len(), 1)?;
    write_slot(out, "* Coord", 0, ifs.coord.as_ref())?;
    write_slot(out, "* Normal", 0, ifs.normal.as_ref())?;
    for (i, attribute) in ifs.float_attributes.iter().enumerate() {
        write_slot(out, "* FloatAttribute", i, Some(&attribute.slot))?;
    }
    Ok(())
}

fn write_slot<W: Write>(out: &mut W, name: &str, slot: usize, data: Option<&Slot<'_>>) -> io::Result<()> {
    match data {
        Some(s) => write_section(out, name, slot, Some(s.data), s.count, s.dim),
        None => write_section::<W, f32>(out, name, slot, None, 0, 0),
    }
}

fn write_section<W: Write, T: Display>(
    out: &mut W,
    name: &str,
    slot: usize,
    data: Option<&[T]>,
    count: usize,
    dim: usize,
) -> io::Result<()> {
    let Some(data) = data else {
        return writeln!(out, "{}\t{}\t0\t0", name, slot);
    };
    writeln!(out, "{}\t{}\t{}\t{}", name, slot, count, dim)?;
    for (i, element) in data.chunks(dim.max(1)).take(count).enumerate() {
        write!(out, "[{}]\t", i)?;
        for value in element {
            write!(out, "{}\t", value)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
