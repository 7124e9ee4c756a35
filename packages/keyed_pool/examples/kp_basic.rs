//! Basic usage of the `keyed_pool` crate:
//!
//! * Building a registry from pool specs.
//! * Checking objects out.
//! * Checking objects back in.
//! * Handling exhaustion.

use keyed_pool::{Error, PlacementSink, PoolRegistry, PoolSpec};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Projectile {
    Bullet,
    Missile,
}

#[derive(Debug)]
struct Body {
    name: &'static str,
    position: (f32, f32),
    visible: bool,
}

/// Hides parked bodies and moves them out of the way, like a scene graph would.
#[derive(Debug)]
struct Hangar;

impl PlacementSink<Body> for Hangar {
    fn park(&self, body: &mut Body) {
        body.position = (0.0, 0.0);
        body.visible = false;
    }

    fn activate(&self, body: &mut Body) {
        body.visible = true;
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let specs = [
        PoolSpec::new(Projectile::Bullet, "bullet", 3),
        PoolSpec::new(Projectile::Missile, "missile", 1),
    ];

    // The factory is only called while the registry is being built.
    let mut registry = PoolRegistry::builder()
        .placement(Hangar)
        .build(specs, |name: &&'static str| Body {
            name: *name,
            position: (0.0, 0.0),
            visible: true,
        })?;

    println!(
        "Registry holds {} pools with {} parked objects",
        registry.len(),
        registry.total_parked()
    );

    let mut missile = registry.checkout(&Projectile::Missile)?;
    missile.position = (10.0, 25.5);
    println!(
        "Fired {} {} at {:?} (visible: {})",
        missile.name,
        missile.id(),
        missile.position,
        missile.visible
    );

    // There was only one missile.
    match registry.checkout(&Projectile::Missile) {
        Err(Error::PoolExhausted { key }) => println!("No more objects in pool {key}"),
        other => println!("Unexpected outcome: {other:?}"),
    }

    // Returning the missile parks it again: hidden and back at the origin.
    registry.check_in(missile, &Projectile::Missile)?;

    let missile = registry.checkout(&Projectile::Missile)?;
    println!(
        "Reused {} {} from {:?}",
        missile.name,
        missile.id(),
        missile.position
    );

    Ok(())
}
