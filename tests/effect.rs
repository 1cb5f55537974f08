use std::cell::RefCell;
use std::rc::Rc;

use reactive_core::{computed, create_effect, reactive_ref, untracked};

#[test]
fn effect_runs() {
    let a = reactive_ref(-1);

    let b = Rc::new(RefCell::new(String::new()));
    let a2 = a.clone();
    let b2 = Rc::clone(&b);
    create_effect(move || {
        let formatted = format!("Value is {}", a2.get());
        *b2.borrow_mut() = formatted;
    });

    assert_eq!(b.borrow().as_str(), "Value is -1");

    a.set(1);

    assert_eq!(b.borrow().as_str(), "Value is 1");
}

#[test]
fn effect_tracks_computed() {
    let a = reactive_ref(-1);
    let a_for_computed = a.clone();
    let b = computed(move || format!("Value is {}", a_for_computed.get()));

    let c = Rc::new(RefCell::new(String::new()));
    let b_for_effect = b.clone();
    let c2 = Rc::clone(&c);
    create_effect(move || {
        *c2.borrow_mut() = b_for_effect.get();
    });

    assert_eq!(b.get().as_str(), "Value is -1");
    assert_eq!(c.borrow().as_str(), "Value is -1");

    a.set(1);

    assert_eq!(b.get().as_str(), "Value is 1");
    assert_eq!(c.borrow().as_str(), "Value is 1");
}

#[test]
fn untracked_mutes_effect() {
    let a = reactive_ref(-1);

    let b = Rc::new(RefCell::new(String::new()));
    let a2 = a.clone();
    let b2 = Rc::clone(&b);
    create_effect(move || {
        let formatted = format!("Value is {}", untracked(|| a2.get()));
        *b2.borrow_mut() = formatted;
    });

    assert_eq!(a.get(), -1);
    assert_eq!(b.borrow().as_str(), "Value is -1");

    a.set(1);

    assert_eq!(a.get(), 1);
    assert_eq!(b.borrow().as_str(), "Value is -1", "untracked read must not subscribe");
}
