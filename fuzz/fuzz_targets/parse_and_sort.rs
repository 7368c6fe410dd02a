#![no_main]
use libfuzzer_sys::fuzz_target;
use vssort::{normalize, Options};

fuzz_target!(|data: &[u8]| {
    let options = Options::default();
    if let Ok(once) = normalize(data, &options) {
        let twice = normalize(once.as_bytes(), &options);
        assert_eq!(twice.ok().as_deref(), Some(once.as_str()));
    }
});
