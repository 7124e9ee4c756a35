//! Loading pool configuration from a TOML manifest and sharing the registry between threads.

use std::thread;

use keyed_pool::{PoolManifest, PoolRegistry};

const MANIFEST: &str = r#"
[[pool]]
key = "asteroid"
template = "large rock"
count = 4

[[pool]]
key = "debris"
template = "small rock"
count = 16
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest = PoolManifest::<String, String>::from_toml_str(MANIFEST)?;

    for spec in manifest.specs() {
        println!(
            "Pool '{}' will hold {} copies of '{}'",
            spec.key(),
            spec.count(),
            spec.template()
        );
    }

    let registry = PoolRegistry::builder().build_shared(manifest, |template: &String| {
        template.clone()
    })?;

    let workers = ["asteroid", "debris"].map(|key| {
        let registry = registry.clone();
        let key = key.to_string();

        thread::spawn(move || {
            let mut spawned = Vec::new();

            while let Ok(object) = registry.checkout(&key) {
                spawned.push(object);
            }

            println!(
                "Spawned {} objects of kind '{key}' before the pool ran dry",
                spawned.len()
            );

            for object in spawned {
                if let Err(e) = registry.check_in(object, &key) {
                    println!("Could not return object: {e}");
                }
            }
        })
    });

    for worker in workers {
        if worker.join().is_err() {
            return Err("worker thread panicked".into());
        }
    }

    println!(
        "{} objects parked, {} checked out",
        registry.total_parked(),
        registry.total_checked_out()
    );

    Ok(())
}
