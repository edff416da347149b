#![no_main]
use libfuzzer_sys::fuzz_target;
use vita_coredump::{analyze_dump_bytes, AnalysisConfig, CrashAnalyzer};

fuzz_target!(|data: &[u8]| {
    let config = AnalysisConfig::default();
    if let Ok(model) = analyze_dump_bytes(data.to_vec(), &config) {
        let _ = CrashAnalyzer::new(&model).crash_reports();
    }
});
