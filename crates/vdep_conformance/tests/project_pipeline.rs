//! On-disk project workflows: `vdep.toml` plus a JSON model snapshot.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use vdep_conformance::{artifact_path, ip, namespace_files, settings_from_toml};
use vdep_engine::{ReportStore, VirtualDependencyHandler};
use vdep_model::ModelSnapshot;

const SHOP_MODULE: &str = r#"
    {
      "import_path": "shop.models",
      "models": [
        { "name": "Product", "is_abstract": true },
        {
          "name": "Book",
          "ancestors": ["shop.models.Product"],
          "default_custom_queryset": "shop.querysets.BookQuerySet",
          "fields": {
            "invoice": { "field_type": "fields.ForeignKey", "related_model": "billing.models.Invoice" }
          }
        }
      ]
    }"#;

const BILLING_MODULE: &str = r#"
    {
      "import_path": "billing.models",
      "models": [ { "name": "Invoice" } ]
    }"#;

fn models_json(modules: &[&str]) -> String {
    format!(
        "{{ \"installed_apps\": [\"shop\", \"billing\"], \"modules\": [{}] }}",
        modules.join(",")
    )
}

/// Writes `vdep.toml` and `models.json` under `root` and returns a handler
/// configured from the former and the snapshot loaded from the latter.
fn write_project(root: &Path, extra: &str) -> (VirtualDependencyHandler, ModelSnapshot) {
    let toml = format!(
        "[project]\nname = \"shop\"\n\n[virtual]\nnamespace = \"__shop__.deps\"\ndestination = \"out\"\n{extra}"
    );
    fs::write(root.join("vdep.toml"), &toml).unwrap();
    fs::write(
        root.join("models.json"),
        models_json(&[SHOP_MODULE, BILLING_MODULE]),
    )
    .unwrap();

    let handler = VirtualDependencyHandler::new(settings_from_toml(&toml, root));
    let snapshot = ModelSnapshot::load(&root.join("models.json")).unwrap();
    (handler, snapshot)
}

#[test]
fn generates_into_configured_namespace() {
    let tmp = TempDir::new().unwrap();
    let (h, snapshot) = write_project(tmp.path(), "");
    let dest = tmp.path().join("out");

    let outcome = h.make_report(&snapshot, &dest).unwrap();
    assert!(outcome.failures.is_empty());

    let files = namespace_files(&dest, "__shop__.deps");
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.starts_with(dest.join("__shop__").join("deps"))));
    assert!(dest.join("report.bin").is_file());
}

#[test]
fn custom_queryset_feeds_alias() {
    let tmp = TempDir::new().unwrap();
    let (h, snapshot) = write_project(tmp.path(), "");
    let dest = tmp.path().join("out");
    h.make_report(&snapshot, &dest).unwrap();

    let content = fs::read_to_string(artifact_path(&h, &dest, &ip("shop.models"))).unwrap();
    assert!(content.contains("    ConcreteQuerySet__Product = shop.querysets.BookQuerySet\n"));
    assert!(content.contains("    Concrete__Product = shop.models.Book\n"));
    assert!(content.contains("    import shop.querysets.BookQuerySet\n"));

    let stored = ReportStore::new(&dest).load().unwrap();
    let related = &stored.report.related_import_paths[&ip("shop.models")];
    assert!(related.contains(&ip("billing.models")));
    assert!(related.contains(&ip("shop.querysets")));
}

#[test]
fn search_paths_keep_artifacts_of_modules_on_disk() {
    let tmp = TempDir::new().unwrap();
    let (h, snapshot) = write_project(tmp.path(), "\n[resolver]\nsearch_paths = [\"src\"]\n");
    let dest = tmp.path().join("out");
    h.make_report(&snapshot, &dest).unwrap();
    let billing = artifact_path(&h, &dest, &ip("billing.models"));

    // billing leaves the snapshot but its source is still importable.
    fs::create_dir_all(tmp.path().join("src/billing/models")).unwrap();
    fs::write(tmp.path().join("src/billing/models/__init__.py"), "").unwrap();
    let shop_only = ModelSnapshot::from_json(&models_json(&[SHOP_MODULE])).unwrap();

    h.make_report(&shop_only, &dest).unwrap();
    assert!(billing.is_file());

    fs::remove_dir_all(tmp.path().join("src/billing")).unwrap();
    h.make_report(&shop_only, &dest).unwrap();
    assert!(!billing.exists());
}

#[test]
fn invalid_namespace_is_rejected() {
    let result = vdep_config::load_config_from_str(
        "[project]\nname = \"shop\"\n\n[virtual]\nnamespace = \"bad..ns\"\n",
    );
    assert!(result.is_err());
}
