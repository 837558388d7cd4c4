use anyhow::Context;
use clap::{Parser, Subcommand};
use fs_err as fs;
use std::path::{Path, PathBuf};
use std::process::Command as ProcessCommand;
use walkmod_types::{DocumentFormat, EditRequest, schema};

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Workspace helper tasks")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the DOCTYPE identifiers walkmod XML documents are written with.
    PrintSchemas,
    /// Scaffold tests/fixtures/<name> with an empty document and case.json.
    NewFixture {
        name: String,
        #[arg(long, default_value = "yaml")]
        format: DocumentFormat,
    },
    /// Check that every fixture has a repo/, an expected/ and a parsable case.json.
    CheckFixtures {
        #[arg(long, default_value = "tests/fixtures")]
        dir: PathBuf,
    },
    /// Bless golden fixtures (overwrite expected outputs).
    BlessFixtures,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::PrintSchemas => {
            println!("{} {}", schema::PUBLIC_ID_V1_1, schema::SYSTEM_ID_V1_1);
            println!("{} {}", schema::PUBLIC_ID_V1_0, schema::SYSTEM_ID_V1_0);
            println!("{} (legacy)", schema::PUBLIC_ID_LEGACY);
        }
        Command::NewFixture { name, format } => {
            let root = Path::new("tests").join("fixtures").join(&name);
            new_fixture(&root, format)?;
            println!("initialized {}", root.display());
        }
        Command::CheckFixtures { dir } => {
            let count = check_fixtures(&dir)?;
            println!("{count} fixtures ok");
        }
        Command::BlessFixtures => {
            let status = ProcessCommand::new("cargo")
                .args(["test", "-p", "walkmod-domain", "--test", "golden_fixtures"])
                .env("WALKMOD_BLESS", "1")
                .status()
                .context("run golden fixture blessing")?;
            if !status.success() {
                anyhow::bail!("bless-fixtures failed");
            }
        }
    }
    Ok(())
}

fn new_fixture(root: &Path, format: DocumentFormat) -> anyhow::Result<()> {
    if root.exists() {
        anyhow::bail!("fixture {} already exists", root.display());
    }
    let repo = root.join("repo");
    fs::create_dir_all(&repo).with_context(|| format!("create {}", repo.display()))?;
    fs::write(repo.join(format.file_name()), "")?;

    let case = serde_json::json!({
        "format": format,
        "request": {
            "action": "add_modules",
            "modules": ["core"]
        }
    });
    fs::write(
        root.join("case.json"),
        serde_json::to_string_pretty(&case).context("serialize case.json")?,
    )?;
    Ok(())
}

fn check_fixtures(dir: &Path) -> anyhow::Result<usize> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    entries.sort();

    for fixture in &entries {
        if !fixture.join("repo").is_dir() {
            anyhow::bail!("{} has no repo/ directory", fixture.display());
        }
        if !fixture.join("expected").is_dir() {
            anyhow::bail!(
                "{} has no expected/ directory; bless it first",
                fixture.display()
            );
        }
        let case_path = fixture.join("case.json");
        let case: serde_json::Value = serde_json::from_str(&fs::read_to_string(&case_path)?)
            .with_context(|| format!("parse {}", case_path.display()))?;
        serde_json::from_value::<DocumentFormat>(case["format"].clone())
            .with_context(|| format!("format in {}", case_path.display()))?;
        serde_json::from_value::<EditRequest>(case["request"].clone())
            .with_context(|| format!("request in {}", case_path.display()))?;
    }
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaffolded_fixture_passes_the_check_once_blessed() {
        let td = tempfile::tempdir().unwrap();
        let root = td.path().join("json_modules");
        new_fixture(&root, DocumentFormat::Json).unwrap();
        assert!(root.join("repo/walkmod.json").exists());

        let err = check_fixtures(td.path()).unwrap_err();
        assert!(
            err.to_string().contains("no expected/ directory"),
            "{err:#}"
        );

        fs::create_dir_all(root.join("expected")).unwrap();
        assert_eq!(check_fixtures(td.path()).unwrap(), 1);
    }

    #[test]
    fn check_rejects_unknown_actions() {
        let td = tempfile::tempdir().unwrap();
        let fixture = td.path().join("broken");
        fs::create_dir_all(fixture.join("repo")).unwrap();
        fs::create_dir_all(fixture.join("expected")).unwrap();
        fs::write(
            fixture.join("case.json"),
            r#"{"format": "xml", "request": {"action": "explode"}}"#,
        )
        .unwrap();

        let err = check_fixtures(td.path()).unwrap_err();
        assert!(format!("{err:#}").contains("request in"), "{err:#}");
    }

    #[test]
    fn new_fixture_refuses_to_overwrite() {
        let td = tempfile::tempdir().unwrap();
        let root = td.path().join("dup");
        new_fixture(&root, DocumentFormat::Yaml).unwrap();
        assert!(new_fixture(&root, DocumentFormat::Yaml).is_err());
    }
}
