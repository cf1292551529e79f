//! Demonstration of the login behavior sensor.
//!
//! This example shows how to:
//! 1. Create a scripted environment and an event hub
//! 2. Start a session subscribed to the hub
//! 3. Push a short burst of login-form interaction through the hub
//! 4. Take a feature snapshot and print it
//!
//! Run with: cargo run --example replay_demo

use std::sync::Arc;

use login_behavior_sensor::{
    BehaviorSession, Config, EventHub, InteractionEvent, ManualEnvironment, TransparencyLog,
    CAPTURE_DECLARATION, FEATURE_ORDER,
};

fn main() {
    println!("Login Behavior Sensor - Replay Demo");
    println!("===================================");
    println!("{CAPTURE_DECLARATION}");

    let config = Config::default();
    let env = Arc::new(ManualEnvironment::new());
    let log = Arc::new(TransparencyLog::new());
    let hub = EventHub::with_transparency_log(env.clone(), config.channel_capacity, log.clone());

    let mut session = BehaviorSession::new(&config, env.clone()).with_transparency_log(log.clone());
    if let Err(e) = session.start_with(&hub) {
        eprintln!("Error starting session: {e}");
        return;
    }

    // Move to the username field, click, type "bob", fix a typo, tab, paste the password.
    let script: Vec<(f64, InteractionEvent)> = vec![
        (400.0, InteractionEvent::pointer_move(100.0, 300.0)),
        (430.0, InteractionEvent::pointer_move(180.0, 260.0)),
        (460.0, InteractionEvent::pointer_move(240.0, 215.0)),
        (490.0, InteractionEvent::pointer_move(250.0, 210.0)),
        (900.0, InteractionEvent::pointer_move(252.0, 211.0)),
        (950.0, InteractionEvent::Click),
        (955.0, InteractionEvent::FocusIn),
        (1200.0, InteractionEvent::key_down("b")),
        (1340.0, InteractionEvent::key_down("o")),
        (1450.0, InteractionEvent::key_down("v")),
        (1700.0, InteractionEvent::key_down("Backspace")),
        (1820.0, InteractionEvent::key_down("b")),
        (2100.0, InteractionEvent::key_down("Tab")),
        (2110.0, InteractionEvent::FocusIn),
        (2600.0, InteractionEvent::Paste),
    ];

    for (t, event) in script {
        env.set_ms(t);
        hub.emit(event);
        session.pump();
    }
    env.set_ms(3000.0);

    let features = session.snapshot();

    match serde_json::to_string_pretty(&features) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing features: {e}"),
    }

    println!();
    for (name, value) in FEATURE_ORDER.iter().zip(features.to_ordered_values()) {
        println!("{name:<36} {value:.4}");
    }

    println!();
    println!("{}", log.summary());
}
