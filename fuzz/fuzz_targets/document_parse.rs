#![no_main]

use camino::Utf8Path;
use libfuzzer_sys::fuzz_target;
use walkmod_edit::{ConfigDocument, XmlDocument, YamlDocument};
use walkmod_types::DocumentFormat;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text must either be rejected or load, assemble and render.
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(doc) = XmlDocument::from_source(Utf8Path::new("walkmod.xml"), Some(s.to_string())) {
        let _ = doc.configuration();
        let _ = doc.render();
    }
    for (name, format) in [
        ("walkmod.yml", DocumentFormat::Yaml),
        ("walkmod.json", DocumentFormat::Json),
    ] {
        let source = Some(s.to_string());
        if let Ok(doc) = YamlDocument::from_source(Utf8Path::new(name), format, source) {
            let _ = doc.configuration();
            let _ = doc.render();
        }
    }
});
