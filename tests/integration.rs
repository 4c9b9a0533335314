//! Black-box tests of the public translation pipeline, exercising the
//! concrete end-to-end scenarios the translator must handle.

use latchc::interpret;

#[test]
fn two_led_blinkers_produce_independent_hoisted_timers() {
    let source = "\
        void setup() { pinMode(7, OUTPUT); pinMode(5, OUTPUT); }\n\
        void loop() {\n\
          thread { int i = 50; sleep(i); digitalWrite(7, HIGH); sleep(i); digitalWrite(7, LOW); }\n\
          thread { int i = 450; sleep(i); digitalWrite(5, HIGH); sleep(i); digitalWrite(5, LOW); }\n\
        }";

    let output = interpret(source).unwrap();

    assert!(output.contains("void _f0()"));
    assert!(output.contains("void _f1()"));
    assert!(output.contains("int _v0 = 50;"));
    assert!(output.contains("int _v1 = 450;"));
    assert!(output.contains("void loop() { _mt0 = millis(); _f0(); _f1(); }"));
    // Each thread's user variable is hoisted under its own name, never
    // shared, even though both threads declare a local `i`.
    assert!(!output.contains("int i"));
}

#[test]
fn sleep_free_if_matches_documented_shape() {
    let source = "void setup() { } void loop() { thread { if (x > 0) { y = 1; } } }";
    let output = interpret(source).unwrap();

    assert!(output.contains("unsigned char _c0 = 0;"));
    assert!(output.contains("unsigned char _c0_c = 0;"));
    assert!(output.contains("unsigned char _r0 = 0;"));
    assert!(output.contains("if (_c0_c == 0) { if (x > 0) { _c0 = 1; } _c0_c = 1; }"));
    assert!(output.contains("if (_c0 == 1) { if (_r0 == 0) { y = 1; _r0 = 1; } }"));
}

#[test]
fn sleep_free_while_matches_documented_shape() {
    let source = "void setup() { } void loop() { thread { while (n > 0) { n = n - 1; } } }";
    let output = interpret(source).unwrap();
    assert!(output.contains("if (_l0 == 0) { while (n > 0) { n = n - 1; } _l0 = 1; }"));
}

#[test]
fn sleep_bearing_while_gates_on_main_timer() {
    let source = "void setup() { } void loop() { thread { while (x < 10) { sleep(100); x = x + 1; } } }";
    let output = interpret(source).unwrap();
    assert!(output.contains("unsigned long _t0 = 0;"));
    assert!(output.contains("unsigned char _t0_c = 0;"));
    assert!(output.contains("if (_l0 == 0) { if (x < 10) {"));
    assert!(output.contains("else { _l0 = 1; }"));
}

#[test]
fn break_inside_sleep_bearing_for_materialises_at_source_position() {
    let source = "\
        void setup() { } \
        void loop() { thread { for (int i = 0; i < 10; i = i + 1) { sleep(50); if (i == 3) { break; } } } }";
    let output = interpret(source).unwrap();
    assert!(output.contains("_l0 = 1; return;"));
    assert!(!output.contains('\u{E000}'));
}

#[test]
fn mixed_threads_keep_independent_latches() {
    let source = "\
        void setup() { } \
        void loop() {\n\
          thread { digitalWrite(7, HIGH); }\n\
          thread { while (x < 5) { sleep(10); x = x + 1; } }\n\
        }";
    let output = interpret(source).unwrap();
    assert!(output.contains("void _f0()"));
    assert!(output.contains("void _f1()"));
    // Only the shared main timer identifier crosses thread boundaries.
    let f0_start = output.find("void _f0()").unwrap();
    let f1_start = output.find("void _f1()").unwrap();
    let f0_body = &output[f0_start..f1_start];
    assert!(!f0_body.contains("_l0"));
    assert!(!f0_body.contains("_t0"));
}

#[test]
fn rejects_switch() {
    let source = "void setup() { } void loop() { thread { switch (x) { } } }";
    let err = interpret(source).unwrap_err();
    assert!(err.to_string().contains("switch"));
}

#[test]
fn rejects_malformed_for_header() {
    let source = "void setup() { } void loop() { thread { for (int i = 0, i < 5, i = i + 1) { a(); } } }";
    assert!(interpret(source).is_err());
}

#[test]
fn repeated_translation_is_deterministic() {
    let source = "void setup() { } void loop() { thread { if (x) { y = 1; } } }";
    assert_eq!(interpret(source).unwrap(), interpret(source).unwrap());
}

#[test]
fn zero_iteration_sleeping_for_sets_exit_latch_without_running_body() {
    let source = "\
        void setup() { } \
        void loop() { thread { for (int i = 10; i < 0; i = i + 1) { sleep(10); a(); } } }";
    let output = interpret(source).unwrap();
    assert!(output.contains("else { _l0 = 1; }"));
}
