//! # SCIM Schema Validator
//!
//! Command-line check that SCIM schema files load through the same parser the
//! [`SchemaRegistry`](scim_engine::SchemaRegistry) uses at startup.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin schema-validator schemas/User.json
//! cargo run --bin schema-validator ./schemas/
//! ```
//!
//! A directory is validated file by file and then loaded into one registry,
//! which also catches duplicate schema ids with conflicting names.
//!
//! ## Output Example
//!
//! ```text
//! Validating schema file: schemas/User.json
//! ✓ Schema is valid!
//!
//! Schema Summary:
//!   ID: urn:ietf:params:scim:schemas:core:2.0:User
//!   Name: User
//!   Attributes: 21
//!   Required attributes: 1
//!   Multi-valued attributes: 8
//!   Attribute types:
//!     - complex: 9
//!     - string: 10
//!   Required attribute names: userName
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: All schemas are valid
//! - `1`: One or more schemas are invalid or validation error occurred

use scim_engine::schema::{Schema, SchemaRegistry, loader::parse_schema};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <schema-file-or-directory>", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} schemas/User.json", args[0]);
        eprintln!("  {} ./schemas/", args[0]);
        process::exit(1);
    }

    let path = Path::new(&args[1]);

    if path.is_file() {
        validate_single_file(path);
    } else if path.is_dir() {
        validate_directory(path);
    } else {
        eprintln!(
            "Error: '{}' is not a valid file or directory",
            path.display()
        );
        process::exit(1);
    }
}

fn validate_single_file(file_path: &Path) {
    println!("Validating schema file: {}", file_path.display());

    match load_schema(file_path) {
        Ok(schema) => {
            println!("✓ Schema is valid!");
            print_schema_summary(&schema);
        }
        Err(e) => {
            eprintln!("❌ Schema validation failed: {}", e);
            process::exit(1);
        }
    }
}

fn validate_directory(dir_path: &Path) {
    println!("Validating schemas in directory: {}", dir_path.display());

    let entries = match fs::read_dir(dir_path) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error reading directory: {}", e);
            process::exit(1);
        }
    };

    let mut files: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    files.sort();

    let mut valid_count = 0;
    let mut error_count = 0;
    for path in &files {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("\nValidating: {}", name);

        match load_schema(path) {
            Ok(schema) => {
                println!("  ✓ Valid - {} ({})", schema.name, schema.id);
                valid_count += 1;
            }
            Err(e) => {
                eprintln!("  ❌ Invalid - {}", e);
                error_count += 1;
            }
        }
    }

    println!("\nValidation Summary:");
    println!("  Valid schemas: {}", valid_count);
    println!("  Invalid schemas: {}", error_count);

    if error_count > 0 {
        process::exit(1);
    }

    println!("\nTesting schema registry loading...");
    let mut registry = SchemaRegistry::new();
    for path in &files {
        if let Err(e) = registry.register_schema_file(path) {
            eprintln!("❌ Failed to load schema registry: {}", e);
            process::exit(1);
        }
    }
    println!("✓ Schema registry loaded successfully");
    println!("  Total schemas loaded: {}", registry.schemas().len());
    for schema in registry.schemas() {
        println!("    - {} ({})", schema.name, schema.id);
    }
}

fn load_schema(file_path: &Path) -> Result<Schema, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(file_path)?;
    let document: serde_json::Value = serde_json::from_str(&content)?;
    Ok(parse_schema(&document)?)
}

fn print_schema_summary(schema: &Schema) {
    println!();
    println!("Schema Summary:");
    println!("  ID: {}", schema.id);
    println!("  Name: {}", schema.name);
    if !schema.description.is_empty() {
        println!("  Description: {}", schema.description);
    }
    println!("  Attributes: {}", schema.attributes.len());

    let mut type_counts = BTreeMap::new();
    for attr in &schema.attributes {
        *type_counts.entry(attr.data_type.as_str()).or_insert(0) += 1;
    }
    let required: Vec<&str> = schema
        .attributes
        .iter()
        .filter(|attr| attr.required)
        .map(|attr| attr.name.as_str())
        .collect();
    let multi_valued = schema.attributes.iter().filter(|attr| attr.multi_valued).count();

    println!("  Required attributes: {}", required.len());
    println!("  Multi-valued attributes: {}", multi_valued);
    println!("  Attribute types:");
    for (attr_type, count) in type_counts {
        println!("    - {}: {}", attr_type, count);
    }

    if !required.is_empty() {
        println!("  Required attribute names: {}", required.join(", "));
    }
}
