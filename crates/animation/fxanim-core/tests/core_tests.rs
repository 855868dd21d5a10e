use std::cell::RefCell;
use std::rc::Rc;

use fxanim_core::{
    parse_effect_table, Animator, Config, EffectConfig, EffectTable, FrameContext, Generator,
    Loops, Puppet, Scheduler, SharedPuppet, DEFAULT_CHAOS_FACTOR, DEFAULT_LOOP_DURATION_MS,
};
use fxanim_test_fixtures::{effects, ManualDriver, TestPuppet};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn approx(a: f64, b: f64, eps: f64) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn shared(table: EffectTable) -> Rc<RefCell<TestPuppet>> {
    Rc::new(RefCell::new(TestPuppet::new(table)))
}

#[test]
fn every_effect_fixture_parses() {
    for name in effects::keys() {
        let table = effects::table(&name).unwrap_or_else(|e| panic!("{name}: {e:#}"));
        assert!(!table.is_empty(), "{name} has no effects");
    }
}

#[test]
fn malformed_fields_fall_back_to_defaults() {
    let table = effects::table("malformed").unwrap();
    assert_eq!(table.names().collect::<Vec<_>>(), ["strength", "ghost", "bare"]);

    let strength = table.get("strength").unwrap();
    assert!(strength.active);
    assert_eq!(strength.loops, Loops::Infinite);
    assert_eq!(strength.loop_duration, DEFAULT_LOOP_DURATION_MS);
    assert_eq!(strength.pause_between_duration, 0.0);
    assert_eq!(strength.sync_shift, 0.0);
    assert_eq!(strength.val1, 0.0);
    assert_eq!(strength.chaos_factor, DEFAULT_CHAOS_FACTOR);
    assert!(!strength.want_integer);
    assert_eq!(strength.generator, Some(Generator::CosOscillation));

    let ghost = table.get("ghost").unwrap();
    assert_eq!(ghost.generator, None);
    assert_eq!(ghost.val1, 4.0);

    assert_eq!(*table.get("bare").unwrap(), EffectConfig::default());
}

#[test]
fn effects_without_generator_are_timed_but_never_written() {
    let puppet = shared(effects::table("malformed").unwrap());
    let mut scheduler = Scheduler::new(ManualDriver::new(), Config::seeded(5));
    let dyn_puppet: SharedPuppet = puppet.clone();
    let id = scheduler.animate_puppet(dyn_puppet).unwrap();
    scheduler.activate();
    scheduler.driver_mut().advance(40.0);
    scheduler.tick();

    let p = puppet.borrow();
    assert_eq!(p.writes.len(), 1);
    assert_eq!(p.writes[0].0, "strength");
    let animator = scheduler.get(id).unwrap();
    assert_eq!(animator.state("ghost").unwrap().elapsed, 40.0);
    assert_eq!(animator.state("ghost").unwrap().bound_generator(), None);
}

#[test]
fn effect_table_serializes_and_reingests() {
    let table = effects::table("glow-pulse").unwrap();
    let text = serde_json::to_string(&table).unwrap();
    assert!(text.contains("\"animType\":\"colorOscillation\""));
    assert!(text.contains("\"loops\":null"));
    let back = parse_effect_table(&text).unwrap();
    assert_eq!(back, table);

    let via_serde: EffectTable = serde_json::from_str(&text).unwrap();
    assert_eq!(via_serde, table);
}

#[test]
fn non_object_table_is_rejected() {
    let err = parse_effect_table("[1, 2]").unwrap_err();
    assert_eq!(err.category(), "ingestion");
    assert!(err.to_string().contains("array"));
    assert!(parse_effect_table("{").is_err());
}

#[test]
fn chaotic_oscillation_stays_within_range() {
    let table = EffectTable::new().with(
        "x",
        EffectConfig {
            val1: -3.0,
            val2: 7.0,
            loop_duration: 900.0,
            chaos_factor: 1.0,
            ..EffectConfig::with_generator(Generator::ChaoticOscillation)
        },
    );
    let puppet = shared(table);
    let dyn_puppet: SharedPuppet = puppet.clone();
    let mut animator = Animator::new(dyn_puppet);
    let mut rng = StdRng::seed_from_u64(9);
    for i in 0..200 {
        let mut frame = FrameContext {
            frame_delta: 16.0,
            clock: 16.0 * i as f64,
            rng: &mut rng,
        };
        animator.animate(&mut frame);
    }
    let writes = puppet.borrow().writes_to("x");
    assert_eq!(writes.len(), 200);
    assert!(writes.iter().all(|v| (-3.0..=7.0).contains(v)));
}

#[test]
fn move_drifts_from_current_value() {
    let table = EffectTable::new().with(
        "offset",
        EffectConfig {
            speed: 0.01,
            ..EffectConfig::with_generator(Generator::Move)
        },
    );
    let mut test_puppet = TestPuppet::new(table);
    test_puppet.set_property("offset", 5.0);
    test_puppet.writes.clear();
    let puppet = Rc::new(RefCell::new(test_puppet));
    let dyn_puppet: SharedPuppet = puppet.clone();
    let mut animator = Animator::new(dyn_puppet);
    let mut rng = StdRng::seed_from_u64(0);

    for delta in [100.0, 50.0] {
        let mut frame = FrameContext {
            frame_delta: delta,
            clock: 0.0,
            rng: &mut rng,
        };
        animator.animate(&mut frame);
    }
    approx(puppet.borrow().property("offset").unwrap(), 5.0 + 1.0 + 0.5, 1e-12);
}

#[test]
fn inactive_effects_are_skipped_entirely() {
    let table = EffectTable::new().with(
        "x",
        EffectConfig {
            active: false,
            ..EffectConfig::with_generator(Generator::Rotation)
        },
    );
    let puppet = shared(table);
    let dyn_puppet: SharedPuppet = puppet.clone();
    let mut animator = Animator::new(dyn_puppet);
    let mut rng = StdRng::seed_from_u64(0);
    let mut frame = FrameContext {
        frame_delta: 16.0,
        clock: 16.0,
        rng: &mut rng,
    };
    assert!(animator.animate(&mut frame));
    assert!(puppet.borrow().writes.is_empty());
    assert_eq!(animator.state("x").unwrap().elapsed, 0.0);
}
