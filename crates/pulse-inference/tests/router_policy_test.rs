//! Property-style tests for the routing policy.
//!
//! The privacy rule is absolute: no combination of the other routing
//! signals may ever move a sensitive query off the local backend. The
//! randomized sweeps here cover the full metadata space many times over,
//! from a fixed seed so any failing combination replays exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pulse_core::{BackendId, PrivacySensitivity, QueryComplexity, RouteMetadata};
use pulse_inference::{ModelRouter, RouterConfig};

fn random_meta(rng: &mut impl Rng, privacy: PrivacySensitivity) -> RouteMetadata {
    let complexity = match rng.gen_range(0..3) {
        0 => QueryComplexity::Low,
        1 => QueryComplexity::Medium,
        _ => QueryComplexity::High,
    };
    RouteMetadata {
        complexity,
        privacy,
        requires_structured_output: rng.gen_bool(0.5),
    }
}

#[test]
fn sensitive_queries_never_leave_the_machine() {
    let mut rng = StdRng::seed_from_u64(7);
    for cost_constrained in [false, true] {
        let router = ModelRouter::with_config(RouterConfig { cost_constrained });
        for _ in 0..1000 {
            let meta = random_meta(&mut rng, PrivacySensitivity::Sensitive);
            assert_eq!(
                router.select(&meta),
                BackendId::Local,
                "sensitive query escaped local routing: {:?}",
                meta
            );
            assert_eq!(
                router.fallback(router.select(&meta), meta.privacy),
                None,
                "sensitive query was offered a fallback: {:?}",
                meta
            );
        }
    }
}

#[test]
fn normal_queries_route_by_documented_precedence() {
    let router = ModelRouter::new();
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..1000 {
        let meta = random_meta(&mut rng, PrivacySensitivity::Normal);
        let backend = router.select(&meta);

        if meta.requires_structured_output {
            assert_eq!(backend, BackendId::Validation);
        } else {
            match meta.complexity {
                QueryComplexity::High => assert_eq!(backend, BackendId::Reasoning),
                // Default config is cost constrained.
                QueryComplexity::Medium | QueryComplexity::Low => {
                    assert_eq!(backend, BackendId::Local)
                }
            }
        }
    }
}

#[test]
fn fallback_chain_terminates() {
    let router = ModelRouter::new();
    for start in [BackendId::Reasoning, BackendId::Validation, BackendId::Local] {
        let mut current = Some(start);
        let mut hops = 0;
        while let Some(backend) = current {
            current = router.fallback(backend, PrivacySensitivity::Normal);
            hops += 1;
            assert!(hops <= 3, "fallback chain did not terminate");
        }
    }
}
