#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = vita_coredump::formats::vita::parse_module_table(data);
    let _ = vita_coredump::formats::vita::parse_thread_table(data);
    let _ = vita_coredump::formats::vita::parse_register_table(data);
});
