use foundation_store::{
    DynamicValue, Entry, Lookup, PersistentStore, PropertyStore, Selector, SqliteConfig,
    SqliteProperties,
};
use serde_json::{json, Value};

type Result<T = ()> = std::result::Result<T, Box<dyn std::error::Error>>;

fn open(db_path: &str, namespace: &str) -> Result<PersistentStore<SqliteProperties>> {
    tracing::debug!(db = db_path, namespace, "opening property file");
    let props = SqliteProperties::open_with_config(
        db_path,
        SqliteConfig {
            namespace: namespace.to_string(),
            ..SqliteConfig::default()
        },
    )?;
    Ok(PersistentStore::new(props))
}

/// `foundation get <db> <selector>`: Print selected values as JSON.
pub fn get(db_path: &str, namespace: &str, selector: &str, with_keys: bool) -> Result {
    let store = open(db_path, namespace)?;
    let selector = Selector::parse(selector)?;

    match render(store.get_with_keys(&selector)?, with_keys) {
        Some(output) => println!("{}", serde_json::to_string_pretty(&output)?),
        None => eprintln!("Key '{selector}' not found"),
    }
    Ok(())
}

/// `foundation set <db> <key> <value>`: Store a JSON value.
pub fn set(db_path: &str, namespace: &str, key: &str, value: &str) -> Result {
    let mut store = open(db_path, namespace)?;
    let value = parse_value(value)?;
    let stored = store.set(key, value)?;
    println!("Set {key} ({})", stored.tag());
    Ok(())
}

/// `foundation remove <db> <selector>`: Remove selected keys.
pub fn remove(db_path: &str, namespace: &str, selector: &str) -> Result {
    let mut store = open(db_path, namespace)?;
    let removed = store.remove(Selector::parse(selector)?)?;
    println!("Removed {removed} key{}", if removed == 1 { "" } else { "s" });
    Ok(())
}

/// `foundation keys <db> [selector]`: List keys in order.
pub fn keys(db_path: &str, namespace: &str, selector: Option<&str>) -> Result {
    let store = open(db_path, namespace)?;
    let keys: Vec<String> = match selector {
        Some(selector) => store
            .get_with_keys(Selector::parse(selector)?)?
            .into_vec()
            .into_iter()
            .map(|entry| entry.key)
            .collect(),
        None => store.keys()?,
    };

    if keys.is_empty() {
        println!("  (no keys)");
    }
    for key in keys {
        println!("{key}");
    }
    Ok(())
}

/// `foundation status <db>`: Show database status and key counts.
pub fn status(db_path: &str) -> Result {
    let props = SqliteProperties::open(db_path)?;
    let size = props.file_size()?;
    let journal = props.journal_mode()?;
    let namespaces = props.namespaces()?;

    println!("Database: {db_path} (SQLite, {journal} mode)");
    println!("Size: {}", format_bytes(size));
    println!();

    if namespaces.is_empty() {
        println!("  (empty database)");
        return Ok(());
    }

    println!("  {:<20} {:>10} {:>12}", "Namespace", "Keys", "Properties");
    println!("  {}", "-".repeat(44));

    let mut total_keys = 0;
    for ns in &namespaces {
        let store = open(db_path, ns)?;
        let keys = store.keys()?.len();
        let properties = store.properties().list_properties()?.len();
        total_keys += keys;
        println!("  {:<20} {:>10} {:>12}", ns, keys, properties);
    }

    println!("  {}", "-".repeat(44));
    println!("  {:<20} {:>10}", "Total", total_keys);
    println!();
    Ok(())
}

/// `foundation reset <db>`: Delete every key in the namespace.
pub fn reset(db_path: &str, namespace: &str) -> Result {
    let mut store = open(db_path, namespace)?;
    let count = store.keys()?.len();
    store.reset()?;
    println!("Reset namespace '{namespace}' ({count} keys removed)");
    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Parse CLI input as JSON, falling back to a plain string.
fn parse_value(text: &str) -> Result<DynamicValue> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(DynamicValue::from_json(value)?),
        Err(_) => Ok(DynamicValue::from(text)),
    }
}

/// JSON output for a lookup. `None` when an exact key is absent.
fn render(lookup: Lookup<Entry<DynamicValue>>, with_keys: bool) -> Option<Value> {
    let entry_json = |entry: Entry<DynamicValue>| {
        if with_keys {
            json!({ "key": entry.key, "value": entry.value.to_json() })
        } else {
            entry.value.to_json()
        }
    };

    match lookup {
        Lookup::One(entry) => entry.map(entry_json),
        Lookup::Many(entries) => Some(Value::Array(entries.into_iter().map(entry_json).collect())),
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation_store::Primitive;

    #[test]
    fn parse_value_follows_json_types() {
        assert_eq!(parse_value("12").unwrap(), DynamicValue::Int(12));
        assert_eq!(parse_value("12.5").unwrap(), DynamicValue::Double(12.5));
        assert_eq!(parse_value("true").unwrap(), DynamicValue::Bool(true));
        assert_eq!(parse_value("\"12\"").unwrap(), DynamicValue::from("12"));
        assert_eq!(
            parse_value("[1, \"a\"]").unwrap(),
            DynamicValue::List(vec![Primitive::Int(1), Primitive::from("a")])
        );
        assert!(matches!(
            parse_value(r#"{"a": 1}"#).unwrap(),
            DynamicValue::Object(_)
        ));
    }

    #[test]
    fn parse_value_falls_back_to_string() {
        assert_eq!(parse_value("ada").unwrap(), DynamicValue::from("ada"));
        assert!(parse_value("null").is_err());
        assert!(parse_value("[[1]]").is_err());
    }

    #[test]
    fn render_shapes() {
        let one = Lookup::One(Some(Entry::new("k", DynamicValue::Int(1))));
        assert_eq!(render(one.clone(), false), Some(json!(1)));
        assert_eq!(render(one, true), Some(json!({"key": "k", "value": 1})));
        assert_eq!(render(Lookup::One(None), true), None);
        assert_eq!(render(Lookup::Many(vec![]), false), Some(json!([])));
    }

    #[test]
    fn commands_round_trip_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("props.db");
        let db = path.to_str().unwrap();

        set(db, "default", "n", "12.5").unwrap();
        set(db, "default", "name", "ada").unwrap();
        set(db, "other", "n", "1").unwrap();
        get(db, "default", "/^n/", true).unwrap();
        keys(db, "default", None).unwrap();
        status(db).unwrap();

        let store = open(db, "default").unwrap();
        assert_eq!(
            store.get("n").unwrap().into_one(),
            Some(DynamicValue::Double(12.5))
        );

        remove(db, "default", "/^na/").unwrap();
        reset(db, "other").unwrap();
        let props = SqliteProperties::open(db).unwrap();
        assert_eq!(props.namespaces().unwrap(), vec!["default"]);
        assert_eq!(
            open(db, "default").unwrap().keys().unwrap(),
            vec!["n".to_string()]
        );
        assert!(props.list_properties().unwrap().len() == 2);
    }

    #[test]
    fn bad_pattern_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("props.db");
        assert!(get(path.to_str().unwrap(), "default", "/(/", false).is_err());
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
    }
}
