use camino::Utf8Path;
use diffy::PatchFormatter;

/// Unified diff of one document. A document created from nothing diffs against `/dev/null`.
pub fn render_patch(path: &Utf8Path, before: Option<&str>, after: &str) -> String {
    let old = before.unwrap_or_default();
    if old == after {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
    match before {
        Some(_) => out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path)),
        None => out.push_str(&format!("--- /dev/null\n+++ b/{0}\n", path)),
    }

    let patch = diffy::create_patch(old, after);
    let body = PatchFormatter::new().fmt_patch(&patch).to_string();
    // diffy repeats its own `---`/`+++` header; keep only the hunks.
    let hunks = body
        .split_once("\n@@")
        .map(|(_, rest)| format!("@@{rest}"))
        .unwrap_or_default();
    out.push_str(&hunks);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
