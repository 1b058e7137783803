#![no_main]
use libfuzzer_sys::fuzz_target;
use mismo::{extract, json, xml_bytes_to_value, ConvertOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = xml_bytes_to_value(data, &ConvertOptions::default()) {
        let _ = json::to_string(&value);
        let _ = extract(&value);
    }
});
