//! Test transport stand-in
//!
//! A physics-free transport loop that shoots straight-line histories
//! through simple geometries and reports every surface crossing to an
//! observer, the way the real engine does.

#![allow(dead_code)]

use rayon::prelude::*;
use surface_source_core_rs::{
    BoundaryKind, CrossingEvent, CrossingObserver, ParticleType, Position, RngManager, SourceSite,
};

/// Sphere surface id
pub const SPHERE: i32 = 1;
/// Dividing z-plane surface id
pub const PLANE: i32 = 2;
/// Lower hemisphere (z < 0)
pub const LOWER: i32 = 1;
/// Upper hemisphere (z > 0)
pub const UPPER: i32 = 2;

/// Unit sphere cut in two by the plane z = 0
///
/// The sphere is a vacuum boundary. The plane's normal points to +z, so a
/// crossing into the upper cell has `u.z > 0`.
pub struct HemisphereModel {
    pub seed: u64,
}

impl HemisphereModel {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Run one history; its random stream depends only on `history`
    pub fn transport(&self, history: u64, observer: &dyn CrossingObserver) {
        let mut rng = RngManager::for_sequence(self.seed, history);

        let r = loop {
            let p = Position::new(
                2.0 * rng.next_f64() - 1.0,
                2.0 * rng.next_f64() - 1.0,
                2.0 * rng.next_f64() - 1.0,
            );
            if p.norm() < 1.0 && p.z != 0.0 {
                break p;
            }
        };
        let mu = 2.0 * rng.next_f64() - 1.0;
        let phi = 2.0 * std::f64::consts::PI * rng.next_f64();
        let s = (1.0 - mu * mu).max(0.0).sqrt();
        let u = Position::new(s * phi.cos(), s * phi.sin(), mu);
        let e = 1.0e6 * (1.0 + rng.next_f64());

        let cell_of = |z: f64| if z < 0.0 { LOWER } else { UPPER };
        let mut cell = cell_of(r.z);

        let site_at = |t: f64, surf_id: i32| SourceSite {
            r: Position::new(r.x + t * u.x, r.y + t * u.y, r.z + t * u.z),
            u,
            e,
            time: t / 2.2e5,
            wgt: 1.0,
            delayed_group: 0,
            surf_id,
            particle: ParticleType::Neutron,
        };

        // Distance to the sphere from inside
        let b = r.dot(&u);
        let c = r.dot(&r) - 1.0;
        let d_sphere = -b + (b * b - c).sqrt();

        // Distance to the plane, if heading towards it
        let d_plane = if u.z != 0.0 { -r.z / u.z } else { f64::INFINITY };

        if d_plane > 0.0 && d_plane < d_sphere {
            let next = if cell == LOWER { UPPER } else { LOWER };
            observer.on_crossing(&CrossingEvent::transmission(
                site_at(d_plane, PLANE),
                vec![cell].into(),
                vec![next].into(),
            ));
            cell = next;
        }

        observer.on_crossing(&CrossingEvent::boundary(
            site_at(d_sphere, SPHERE),
            BoundaryKind::Vacuum,
            vec![cell].into(),
        ));
    }

    /// Run `histories` sequentially on the calling thread
    pub fn run_serial(&self, histories: u64, observer: &dyn CrossingObserver) {
        for h in 0..histories {
            self.transport(h, observer);
        }
    }

    /// Run `histories` on a dedicated pool of `threads` workers
    pub fn run_parallel(&self, histories: u64, threads: usize, observer: &dyn CrossingObserver) {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .expect("thread pool");
        pool.install(|| {
            (0..histories)
                .into_par_iter()
                .for_each(|h| self.transport(h, observer));
        });
    }
}

/// Minimal site for hand-built events
pub fn site(surf_id: i32, u: [f64; 3]) -> SourceSite {
    SourceSite {
        r: Position::new(0.0, 0.0, 0.0),
        u: Position::from(u),
        e: 1.0e6,
        time: 0.0,
        wgt: 1.0,
        delayed_group: 0,
        surf_id,
        particle: ParticleType::Neutron,
    }
}

/// Site tagged by an integer stored in the x position
pub fn tagged_site(tag: u64) -> SourceSite {
    SourceSite {
        r: Position::new(tag as f64, 0.0, 0.0),
        ..site(1, [0.0, 0.0, 1.0])
    }
}
