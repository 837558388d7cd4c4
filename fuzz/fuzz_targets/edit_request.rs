#![no_main]

use camino::Utf8Path;
use libfuzzer_sys::fuzz_target;
use walkmod_domain::{Action, action_for};
use walkmod_edit::{ConfigDocument, YamlDocument};
use walkmod_types::{DocumentFormat, EditRequest};

const FLAT: &str = "transformations:\n- type: \"t1\"\n";

fuzz_target!(|data: &[u8]| {
    // A parsed request applied twice must not report a change the second
    // time, except for transformation adds which stack.
    let Ok(request) = serde_json::from_slice::<EditRequest>(data) else {
        return;
    };
    let action = action_for(&request);
    if action.validate().is_err() {
        return;
    }

    let path = Utf8Path::new("walkmod.yml");
    let source = Some(FLAT.to_string());
    let Ok(mut doc) = YamlDocument::from_source(path, DocumentFormat::Yaml, source) else {
        return;
    };
    if action.apply(&mut doc).is_err() {
        return;
    }
    let _ = doc.render();

    if !matches!(request, EditRequest::AddTransformation(_)) {
        assert_eq!(action.apply(&mut doc).ok(), Some(false));
    }
});
