//! Builders for synthetic kernel note blobs and ELF core files.
//!
//! Layouts mirror what the kernel writes: module records with segment
//! sub-records and an exception-table trailer, self-length-prefixed thread
//! and register records, all behind an 8-byte table header.

#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

pub const PT_LOAD: u32 = 1;
pub const PT_NOTE: u32 = 4;
pub const ET_CORE: u16 = 4;
pub const EM_ARM: u16 = 40;

pub const ATTR_RX: u32 = 5;
pub const ATTR_RW: u32 = 6;

pub const DATA_ABORT: u32 = 0x30004;
pub const UNDEFINED_INSTRUCTION: u32 = 0x30002;

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_cstring(buf: &mut [u8], offset: usize, s: &str, limit: usize) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(limit - offset - 1);
    buf[offset..offset + n].copy_from_slice(&bytes[..n]);
}

/// One module record: 0x50 header, `(attr, start, size)` segments, trailer.
pub fn module_record(id: u32, name: &str, segments: &[(u32, u32, u32)]) -> Vec<u8> {
    let mut header = vec![0u8; 0x50];
    put_u32(&mut header, 0x04, id);
    put_cstring(&mut header, 0x24, name, 0x4C);
    put_u32(&mut header, 0x4C, segments.len() as u32);

    let mut out = header;
    for &(attr, start, size) in segments {
        let mut seg = vec![0u8; 0x14];
        put_u32(&mut seg, 0, 0x14);
        put_u32(&mut seg, 4, attr);
        put_u32(&mut seg, 8, start);
        put_u32(&mut seg, 12, size);
        put_u32(&mut seg, 16, 0x10);
        out.extend_from_slice(&seg);
    }
    let mut trailer = vec![0u8; 0x10];
    put_u32(&mut trailer, 0, 0xAAAA_0000);
    put_u32(&mut trailer, 4, 0xAAAA_0100);
    put_u32(&mut trailer, 8, 0xBBBB_0000);
    put_u32(&mut trailer, 12, 0xBBBB_0100);
    out.extend_from_slice(&trailer);
    out
}

/// Thread record of an explicit declared length.
pub fn thread_record_len(
    len: usize,
    id: u32,
    name: &str,
    stop_reason: u32,
    status: u16,
    pc: Option<u32>,
) -> Vec<u8> {
    let mut rec = vec![0u8; len.max(0xA0)];
    put_u32(&mut rec, 0, len as u32);
    put_u32(&mut rec, 0x04, id);
    put_cstring(&mut rec, 0x08, name, 0x28);
    rec[0x30..0x32].copy_from_slice(&status.to_le_bytes());
    put_u32(&mut rec, 0x74, stop_reason);
    if let Some(pc) = pc {
        put_u32(&mut rec, 0x9C, pc);
    }
    rec.truncate(len);
    rec
}

/// Thread record; 0xA0 bytes when it carries a PC, 0x98 otherwise.
pub fn thread_record(id: u32, name: &str, stop_reason: u32, status: u16, pc: Option<u32>) -> Vec<u8> {
    let len = if pc.is_some() { 0xA0 } else { 0x98 };
    thread_record_len(len, id, name, stop_reason, status, pc)
}

/// Register record: length, thread id, sixteen registers.
pub fn register_record(thread_id: u32, gpr: [u32; 16]) -> Vec<u8> {
    let mut rec = vec![0u8; 0x48];
    put_u32(&mut rec, 0, 0x48);
    put_u32(&mut rec, 4, thread_id);
    for (i, r) in gpr.iter().enumerate() {
        put_u32(&mut rec, 8 + 4 * i, *r);
    }
    rec
}

/// Table blob declaring `count` elements followed by `records`.
pub fn table_with_count(count: u32, records: &[Vec<u8>]) -> Vec<u8> {
    let mut blob = vec![0u8; 8];
    put_u32(&mut blob, 4, count);
    for r in records {
        blob.extend_from_slice(r);
    }
    blob
}

pub fn table(records: &[Vec<u8>]) -> Vec<u8> {
    table_with_count(records.len() as u32, records)
}

/// Registers with `R<n> = n * 0x11` and the given SP/LR/PC.
pub fn registers(sp: u32, lr: u32, pc: u32) -> [u32; 16] {
    let mut gpr = [0u32; 16];
    for (i, r) in gpr.iter_mut().enumerate().take(13) {
        *r = i as u32 * 0x11;
    }
    gpr[13] = sp;
    gpr[14] = lr;
    gpr[15] = pc;
    gpr
}

/// Assembles an ELF32 LE core with one `PT_NOTE` segment and any number of
/// `PT_LOAD` segments.
#[derive(Default)]
pub struct CoreBuilder {
    notes: Vec<(String, Vec<u8>)>,
    loads: Vec<(u32, Vec<u8>)>,
}

fn pad4(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

impl CoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(mut self, name: &str, desc: Vec<u8>) -> Self {
        self.notes.push((name.to_string(), desc));
        self
    }

    pub fn load(mut self, vaddr: u32, bytes: Vec<u8>) -> Self {
        self.loads.push((vaddr, bytes));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut note_seg = Vec::new();
        for (name, desc) in &self.notes {
            note_seg.extend_from_slice(&(name.len() as u32 + 1).to_le_bytes());
            note_seg.extend_from_slice(&(desc.len() as u32).to_le_bytes());
            note_seg.extend_from_slice(&0u32.to_le_bytes());
            note_seg.extend_from_slice(name.as_bytes());
            note_seg.push(0);
            pad4(&mut note_seg);
            note_seg.extend_from_slice(desc);
            pad4(&mut note_seg);
        }

        let phnum = 1 + self.loads.len();
        let phoff = 52;
        let mut offset = phoff + phnum * 32;
        let mut data = vec![0u8; offset];
        data[0..4].copy_from_slice(b"\x7fELF");
        data[4] = 1;
        data[5] = 1;
        data[6] = 1;
        data[16..18].copy_from_slice(&ET_CORE.to_le_bytes());
        data[18..20].copy_from_slice(&EM_ARM.to_le_bytes());
        put_u32(&mut data, 20, 1);
        put_u32(&mut data, 28, phoff as u32);
        data[40..42].copy_from_slice(&52u16.to_le_bytes());
        data[42..44].copy_from_slice(&32u16.to_le_bytes());
        data[44..46].copy_from_slice(&(phnum as u16).to_le_bytes());

        let mut ph = phoff;
        put_u32(&mut data, ph, PT_NOTE);
        put_u32(&mut data, ph + 4, offset as u32);
        put_u32(&mut data, ph + 16, note_seg.len() as u32);
        offset += note_seg.len();
        ph += 32;

        for (vaddr, bytes) in &self.loads {
            put_u32(&mut data, ph, PT_LOAD);
            put_u32(&mut data, ph + 4, offset as u32);
            put_u32(&mut data, ph + 8, *vaddr);
            put_u32(&mut data, ph + 16, bytes.len() as u32);
            put_u32(&mut data, ph + 20, bytes.len() as u32);
            put_u32(&mut data, ph + 24, 6);
            offset += bytes.len();
            ph += 32;
        }

        data.extend_from_slice(&note_seg);
        for (_, bytes) in &self.loads {
            data.extend_from_slice(bytes);
        }
        data
    }
}

pub const APP_CODE: u32 = 0x8100_0000;
pub const APP_DATA: u32 = 0x8110_0000;
pub const KERNEL_CODE: u32 = 0xE000_0000;
pub const MAIN_THREAD: u32 = 0x4001_0003;
pub const IDLE_THREAD: u32 = 0x4001_0005;
pub const WORKER_THREAD: u32 = 0x4001_0007;
pub const ORPHAN_THREAD: u32 = 0x4001_9999;
pub const MAIN_SP: u32 = APP_DATA + 0x100;

/// A dump of a homebrew app whose main thread hit a data abort.
///
/// The worker thread also crashed but its registers were not captured, and
/// one register set names a thread that does not exist.
pub fn crashed_app_dump() -> Vec<u8> {
    let modules = table(&[
        module_record(
            0x4001_0001,
            "homebrew",
            &[(ATTR_RX, APP_CODE, 0x2000), (ATTR_RW, APP_DATA, 0x1000)],
        ),
        module_record(0x4001_0011, "SceLibKernel", &[(ATTR_RX, KERNEL_CODE, 0x1000)]),
    ]);
    let threads = table(&[
        thread_record(MAIN_THREAD, "main", DATA_ABORT, 1, Some(APP_CODE + 0x135)),
        thread_record(IDLE_THREAD, "idle", 0, 8, None),
        thread_record(WORKER_THREAD, "worker", UNDEFINED_INSTRUCTION, 1, Some(0x10)),
    ]);
    let regs = table(&[
        register_record(MAIN_THREAD, registers(MAIN_SP, APP_CODE + 0x201, APP_CODE + 0x135)),
        register_record(IDLE_THREAD, registers(APP_DATA + 0x800, 0, KERNEL_CODE + 0x40)),
        register_record(ORPHAN_THREAD, registers(0, 0, 0)),
    ]);

    // stack words: the word at SP points into app code
    let stack: Vec<u8> = (0..0x80u32)
        .flat_map(|i| {
            let v = if i == 0x40 { APP_CODE + 0x201 } else { i };
            v.to_le_bytes()
        })
        .collect();

    CoreBuilder::new()
        .note("MODULE_INFO", modules)
        .note("THREAD_INFO", threads)
        .note("THREAD_REG_INFO", regs)
        .load(APP_CODE, vec![0u8; 0x200])
        .load(APP_DATA, stack)
        .build()
}

/// Write `content` to a temporary file.
pub fn create_temp_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}
