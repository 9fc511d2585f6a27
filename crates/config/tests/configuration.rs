//! Integration tests for layered configuration files

use pandocomatic_config::{
    Configuration, ConfigurationSource, Error, PandocMetadata, TemplateField, Value,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_with_relative_data_dir() {
    let temp = TempDir::new().unwrap();
    let path = write(
        temp.path(),
        "pandocomatic.yaml",
        "settings:\n  data-dir: ./data\n",
    );

    let configuration = Configuration::load(&path, "/fallback").unwrap();
    assert_eq!(configuration.data_dir(), temp.path().join("data"));
}

#[test]
fn test_load_with_parent_data_dir() {
    let temp = TempDir::new().unwrap();
    let path = write(
        temp.path(),
        "sub/pandocomatic.yaml",
        "settings:\n  data-dir: ../shared\n",
    );

    let configuration = Configuration::load(&path, "/fallback").unwrap();
    assert_eq!(configuration.data_dir(), temp.path().join("shared"));
}

#[test]
fn test_load_with_absolute_data_dir() {
    let temp = TempDir::new().unwrap();
    let path = write(
        temp.path(),
        "pandocomatic.yaml",
        "settings:\n  data-dir: /srv/pandocomatic\n",
    );

    let configuration = Configuration::load(&path, "/fallback").unwrap();
    assert_eq!(configuration.data_dir(), Path::new("/srv/pandocomatic"));
}

#[test]
fn test_load_without_data_dir_uses_default() {
    let temp = TempDir::new().unwrap();
    let path = write(temp.path(), "pandocomatic.yaml", "");

    let configuration = Configuration::load(&path, "/fallback").unwrap();
    assert_eq!(configuration.data_dir(), Path::new("/fallback"));
    assert!(configuration.templates().is_empty());
}

#[test]
fn test_load_reports_cycles_as_load_errors() {
    let temp = TempDir::new().unwrap();
    let path = write(
        temp.path(),
        "pandocomatic.yaml",
        "templates:\n  a: {extends: b}\n  b: {extends: a}\n",
    );

    let err = Configuration::load(&path, "/data").unwrap_err();
    assert!(matches!(err, Error::ConfigurationLoad { .. }));
    assert!(err.to_string().contains("pandocomatic.yaml"));
}

#[test]
fn test_reconfigure_leaves_parent_untouched() {
    let temp = TempDir::new().unwrap();
    let root = write(
        temp.path(),
        "pandocomatic.yaml",
        r"
templates:
  web:
    glob: ['*.md']
    pandoc: {to: html5}
",
    );
    let nested = write(
        temp.path(),
        "chapters/pandocomatic.yaml",
        r"
settings:
  skip: ['draft-*']
  data-dir: /ignored
templates:
  web:
    pandoc: {toc: true}
  print:
    extends: web
    glob: ['*.tex']
",
    );

    let parent = Configuration::load(&root, "/data").unwrap();
    let child = parent.reconfigure(&nested).unwrap();

    assert!(child.skip(Path::new("draft-1.md")));
    assert!(!parent.skip(Path::new("draft-1.md")));
    assert!(child.has_template("print"));
    assert!(!parent.has_template("print"));
    assert_eq!(child.data_dir(), Path::new("/data"));

    let toc = |configuration: &Configuration| {
        configuration
            .get_template("web")
            .and_then(|t| t.pandoc())
            .and_then(|pandoc| pandoc.get("toc"))
            .cloned()
    };
    assert_eq!(toc(&child), Some(Value::Bool(true)));
    assert_eq!(toc(&parent), None);
}

#[test]
fn test_failed_reconfigure_keeps_nothing() {
    let temp = TempDir::new().unwrap();
    let bad = write(temp.path(), "bad.yaml", "templates: [oops]\n");

    let parent = Configuration::new("/data");
    let err = parent.reconfigure(&bad).unwrap_err();
    assert!(matches!(err, Error::ConfigurationLoad { .. }));
    assert!(parent.templates().is_empty());
}

#[test]
fn test_inheritance_is_transitive_across_a_file() {
    let temp = TempDir::new().unwrap();
    let path = write(
        temp.path(),
        "pandocomatic.yaml",
        r"
templates:
  a:
    extends: b
    glob: ['*.md']
  b:
    extends: c
  c:
    metadata: {author: C}
    pandoc: {to: latex}
",
    );

    let configuration = Configuration::load(&path, "/data").unwrap();
    let a = configuration.get_template("a").unwrap();
    assert_eq!(
        a.metadata().unwrap().get("author"),
        Some(&Value::from("C"))
    );
    assert_eq!(
        configuration.set_destination(Path::new("/out/x.md"), Some("a"), &PandocMetadata::empty()),
        PathBuf::from("/out/x.tex")
    );
    assert_eq!(
        configuration.template_names().collect::<Vec<_>>(),
        ["a", "b", "c"]
    );
}

#[test]
fn test_layers_accumulate_on_the_same_template() {
    let first = ConfigurationSource::from_yaml_str(
        "templates:\n  web:\n    glob: ['*.md']\n    preprocessors: [a.sh, b.sh]\n",
    )
    .unwrap();
    let second = ConfigurationSource::from_yaml_str(
        "templates:\n  web:\n    pandoc: {to: html5}\n    preprocessors: {remove: a.sh, add: c.sh}\n",
    )
    .unwrap();

    let configuration = Configuration::new("/data")
        .with_source(first)
        .unwrap()
        .with_source(second)
        .unwrap();

    let web = configuration.get_template("web").unwrap();
    assert_eq!(web.globs(), ["*.md"]);
    assert_eq!(
        web.get(TemplateField::Preprocessors),
        Some(&Value::Sequence(vec!["c.sh".into(), "b.sh".into()]))
    );
    assert_eq!(
        configuration.find_extension(Path::new("x.md"), Some("web"), &PandocMetadata::empty()),
        "html"
    );
}

#[test]
fn test_dangling_extends_is_not_fatal() {
    let source = ConfigurationSource::from_yaml_str(
        "templates:\n  a:\n    extends: [Ghost]\n    glob: ['*.md']\n",
    )
    .unwrap();

    let configuration = Configuration::new("/data").with_source(source).unwrap();
    assert_eq!(configuration.get_template("a").unwrap().globs(), ["*.md"]);
    assert!(configuration.convert(Path::new("notes.md")));
}

#[test]
fn test_file_matching_scenarios() {
    let source = ConfigurationSource::from_yaml_str(
        r"
settings:
  skip: ['*.bak', 'draft-*']
templates:
  web: {glob: ['*.md']}
  slides: {glob: ['slides-*.md']}
",
    )
    .unwrap();
    let configuration = Configuration::new("/data").with_source(source).unwrap();

    // (path, skipped, converted, templates, description)
    let cases: Vec<(&str, bool, bool, Vec<&str>, &str)> = vec![
        ("/docs/report.md", false, true, vec!["web"], "Plain markdown"),
        ("/docs/slides-1.md", false, true, vec!["web"], "First match wins"),
        ("/docs/.hidden.md", true, false, vec![], "Hidden files are skipped"),
        ("/docs/old.bak", true, false, vec![], "Configured skip pattern"),
        ("/docs/draft-1.md", true, false, vec![], "Skip wins over a matching glob"),
        ("/docs/pandocomatic.yaml", true, false, vec![], "Configuration file"),
        ("/docs/image.png", false, false, vec![], "No template applies"),
    ];

    for (path, skipped, converted, templates, description) in cases {
        let path = Path::new(path);
        assert_eq!(configuration.skip(path), skipped, "skip: {description}");
        assert_eq!(configuration.convert(path), converted, "convert: {description}");
        assert_eq!(
            configuration.determine_templates(path),
            templates,
            "templates: {description}"
        );
    }

    let all = configuration
        .with_source(ConfigurationSource::from_yaml_str("settings:\n  match-files: all\n").unwrap())
        .unwrap();
    assert_eq!(
        all.determine_templates(Path::new("slides-1.md")),
        ["web", "slides"]
    );
}

#[test]
fn test_destination_scenarios() {
    let source = ConfigurationSource::from_yaml_str(
        r"
templates:
  web: {glob: ['*.md'], pandoc: {to: html5}}
  pdf: {pandoc: {to: latex, output: out/final.pdf}}
",
    )
    .unwrap();
    let configuration = Configuration::new("/data").with_source(source).unwrap();
    let none = PandocMetadata::empty();

    assert_eq!(
        configuration.set_destination(Path::new("/docs/report.md"), Some("web"), &none),
        PathBuf::from("/docs/report.html")
    );
    assert_eq!(
        configuration.set_destination(Path::new("/docs/report.md"), Some("pdf"), &none),
        PathBuf::from("/docs/out/final.pdf")
    );

    let metadata = PandocMetadata::from_front_matter(
        "---\npandocomatic_:\n  pandoc:\n    to: markdown+smart\n---\n",
    )
    .unwrap();
    assert_eq!(
        configuration.set_destination(Path::new("/docs/report.txt"), Some("web"), &metadata),
        PathBuf::from("/docs/report.md")
    );
}

#[test]
fn test_toml_layer() {
    let temp = TempDir::new().unwrap();
    let path = write(
        temp.path(),
        "pandocomatic.toml",
        r#"
[settings]
match-files = "all"

[templates.web]
glob = ["*.md"]
"#,
    );

    let configuration = Configuration::load(&path, "/data").unwrap();
    assert!(configuration.match_all_templates());
    assert_eq!(configuration.determine_templates(Path::new("a.md")), ["web"]);
}

#[cfg(unix)]
mod rename {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn executable(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = write(dir, name, body);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_rename_script_from_data_dir() {
        let data = TempDir::new().unwrap();
        executable(
            data.path(),
            "upper.sh",
            "#!/bin/sh\nread dst\necho \"$(dirname \"$dst\")/RENAMED.html\"\n",
        );

        let source = ConfigurationSource::from_yaml_str(
            "templates:\n  web: {pandoc: {to: html5, rename: upper.sh}}\n",
        )
        .unwrap();
        let configuration = Configuration::new(data.path()).with_source(source).unwrap();

        assert_eq!(
            configuration.set_destination(
                Path::new("/docs/report.md"),
                Some("web"),
                &PandocMetadata::empty()
            ),
            PathBuf::from("/docs/RENAMED.html")
        );
    }

    #[test]
    fn test_local_rename_script_from_document() {
        let docs = TempDir::new().unwrap();
        executable(docs.path(), "suffix.sh", "#!/bin/sh\nread dst\necho \"$dst.$1\"\n");

        let metadata = PandocMetadata::from_front_matter(
            "---\npandocomatic:\n  pandoc:\n    to: latex\n    rename: ./suffix.sh v2\n---\n",
        )
        .unwrap();
        let configuration = Configuration::new("/data");
        let dst = docs.path().join("report.md");

        assert_eq!(
            configuration.set_destination(&dst, None, &metadata),
            docs.path().join("report.tex.v2")
        );
    }

    #[test]
    fn test_silent_rename_script_keeps_destination() {
        let data = TempDir::new().unwrap();
        executable(data.path(), "silent.sh", "#!/bin/sh\ncat > /dev/null\n");

        let source = ConfigurationSource::from_yaml_str(
            "templates:\n  web: {pandoc: {rename: silent.sh}}\n",
        )
        .unwrap();
        let configuration = Configuration::new(data.path()).with_source(source).unwrap();

        assert_eq!(
            configuration.set_destination(
                Path::new("/docs/report.md"),
                Some("web"),
                &PandocMetadata::empty()
            ),
            PathBuf::from("/docs/report.html")
        );
    }

    #[test]
    fn test_failing_rename_script_keeps_destination() {
        let data = TempDir::new().unwrap();
        executable(data.path(), "fail.sh", "#!/bin/sh\nexit 3\n");

        let source = ConfigurationSource::from_yaml_str(
            "templates:\n  web: {pandoc: {to: html5, rename: fail.sh}}\n",
        )
        .unwrap();
        let configuration = Configuration::new(data.path()).with_source(source).unwrap();

        assert_eq!(
            configuration.set_destination(
                Path::new("/docs/report.md"),
                Some("web"),
                &PandocMetadata::empty()
            ),
            PathBuf::from("/docs/report.html")
        );
    }
}
