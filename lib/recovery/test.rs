use crate::decoder::DestinationType::{Call, ControlFlow};
use crate::decoder::{Instruction, Scripted};
use crate::memory::MemoryImage;
use crate::recovery::*;
use crate::store::{Tag, TagValue, TaggedStore};

fn op(address: u64, size: usize) -> Instruction {
    Instruction::new(address, vec![0x90; size], format!("op{}", size)).with_fallthrough()
}

fn ret(address: u64) -> Instruction {
    Instruction::new(address, vec![0xc3], "ret").with_terminal(true)
}

fn call(address: u64, target: u64) -> Instruction {
    Instruction::new(address, vec![0xe8; 5], format!("call 0x{:x}", target))
        .with_destination(target, Call)
        .with_fallthrough()
}

fn branch(address: u64, target: u64) -> Instruction {
    Instruction::new(address, vec![0x74; 2], format!("je 0x{:x}", target))
        .with_destination(target, ControlFlow)
        .with_fallthrough()
}

fn script(instructions: Vec<Instruction>) -> Scripted {
    let mut scripted = Scripted::new();
    for instruction in instructions {
        scripted.insert(instruction);
    }
    scripted
}

fn recover_with(decoder: &Scripted, entry: u64, options: &Options) -> (TaggedStore, Recovery) {
    let memory = MemoryImage::new();
    let mut store = TaggedStore::new();
    let recovery = Recoverer::new(&memory, &mut store, decoder, options).recover(entry);
    (store, recovery)
}

fn recover(decoder: &Scripted, entry: u64) -> (TaggedStore, Recovery) {
    recover_with(decoder, entry, &Options::default())
}

fn members(store: &TaggedStore, function: u64, block: u64) -> Vec<u64> {
    store
        .function(function)
        .unwrap()
        .block(block)
        .unwrap()
        .addresses()
        .iter()
        .copied()
        .collect()
}

fn references(references: &std::collections::BTreeSet<u64>) -> Vec<u64> {
    references.iter().copied().collect()
}

#[test]
fn straight_line_function() {
    let decoder = script(vec![op(0x100, 1), op(0x101, 3), op(0x104, 2), ret(0x106)]);

    let (store, recovery) = recover(&decoder, 0x100);

    assert!(recovery.is_complete());
    assert_eq!(recovery.functions(), &[0x100]);
    assert_eq!(recovery.instructions(), 4);
    assert_eq!(store.functions().len(), 1);

    let function = store.function(0x100).unwrap();
    assert_eq!(function.num_blocks(), 1);
    assert_eq!(members(&store, 0x100, 0x100), vec![0x100, 0x101, 0x104, 0x106]);
    assert_eq!(function.block(0x100).unwrap().end(), 0x106);

    for &address in &[0x100, 0x101, 0x104, 0x106] {
        let record = store.record(address).unwrap();
        assert_eq!(record.function(), Some(0x100));
        assert_eq!(record.block(), Some(0x100));
        assert!(record.instruction().is_some());
    }
    assert_eq!(store.record(0x101).unwrap().len(), Some(3));
}

#[test]
fn call_does_not_split_block() {
    let decoder = script(vec![call(0x100, 0x200), ret(0x105), ret(0x200)]);

    let (mut store, recovery) = recover(&decoder, 0x100);

    assert!(recovery.is_complete());
    assert_eq!(recovery.functions(), &[0x100, 0x200]);

    let caller = store.function(0x100).unwrap();
    assert_eq!(caller.num_blocks(), 1);
    assert!(caller.block(0x200).is_none());
    assert_eq!(members(&store, 0x100, 0x100), vec![0x100, 0x105]);

    assert_eq!(members(&store, 0x200, 0x200), vec![0x200]);
    assert_eq!(store.function_of(0x200), Some(0x200));

    assert_eq!(references(store.xrefs(0x200)), vec![0x100]);
    assert!(store.crefs(0x200).is_empty());
}

#[test]
fn branch_splits_block() {
    let decoder = script(vec![
        op(0x100, 1),
        branch(0x101, 0x106),
        op(0x103, 3),
        ret(0x106),
    ]);

    let (mut store, _) = recover(&decoder, 0x100);

    let function = store.function(0x100).unwrap();
    assert_eq!(function.num_blocks(), 2);
    // The fallthrough of a branch does not start a block of its own.
    assert_eq!(members(&store, 0x100, 0x100), vec![0x100, 0x101, 0x103]);
    assert_eq!(members(&store, 0x100, 0x106), vec![0x106]);

    assert_eq!(references(store.crefs(0x106)), vec![0x101]);
    assert!(store.crefs(0x103).is_empty());
    assert_eq!(store.record(0x106).unwrap().block(), Some(0x106));
}

#[test]
fn loop_back_to_entry() {
    let decoder = script(vec![op(0x100, 1), branch(0x101, 0x100), ret(0x103)]);

    let (mut store, recovery) = recover(&decoder, 0x100);

    assert_eq!(recovery.instructions(), 3);
    assert_eq!(store.function(0x100).unwrap().num_blocks(), 1);
    assert_eq!(members(&store, 0x100, 0x100), vec![0x100, 0x101, 0x103]);
    assert_eq!(references(store.crefs(0x100)), vec![0x101]);
}

#[test]
fn mutual_recursion_terminates() {
    let decoder = script(vec![
        call(0x100, 0x200),
        ret(0x105),
        call(0x200, 0x100),
        ret(0x205),
    ]);

    let (mut store, recovery) = recover(&decoder, 0x100);

    assert!(recovery.is_complete());
    assert_eq!(recovery.functions(), &[0x100, 0x200]);
    assert_eq!(store.functions().len(), 2);
    assert_eq!(references(store.xrefs(0x100)), vec![0x200]);
    assert_eq!(references(store.xrefs(0x200)), vec![0x100]);
}

#[test]
fn transitive_call_graph() {
    let decoder = script(vec![
        call(0x100, 0x200),
        call(0x105, 0x300),
        ret(0x10a),
        call(0x200, 0x300),
        ret(0x205),
        call(0x300, 0x400),
        ret(0x305),
        ret(0x400),
    ]);

    let (mut store, recovery) = recover(&decoder, 0x100);

    assert_eq!(
        store.functions().keys().copied().collect::<Vec<u64>>(),
        vec![0x100, 0x200, 0x300, 0x400]
    );
    assert_eq!(recovery.functions().len(), 4);
    assert_eq!(references(store.xrefs(0x300)), vec![0x105, 0x200]);
}

#[test]
fn no_recursion() {
    let decoder = script(vec![call(0x100, 0x200), ret(0x105), ret(0x200)]);
    let options = OptionsBuilder::new().recurse(false).build();

    let (mut store, recovery) = recover_with(&decoder, 0x100, &options);

    assert!(recovery.is_complete());
    assert_eq!(recovery.functions(), &[0x100]);
    assert!(store.function(0x200).is_none());
    assert_eq!(references(store.xrefs(0x200)), vec![0x100]);
}

#[test]
fn undecodable_ends_block() {
    // Nothing is scripted at 0x101.
    let decoder = script(vec![op(0x100, 1)]);

    let (store, recovery) = recover(&decoder, 0x100);

    assert!(recovery.is_complete());
    assert_eq!(members(&store, 0x100, 0x100), vec![0x100, 0x101]);
    assert_eq!(store.record(0x101).unwrap().len(), Some(0));
    assert!(store.instruction(0x101).unwrap().is_terminal());
}

#[test]
fn instruction_budget() {
    let decoder = script(vec![op(0x100, 1), op(0x101, 3), op(0x104, 2), ret(0x106)]);
    let options = OptionsBuilder::new().max_instructions(2).build();

    let (store, recovery) = recover_with(&decoder, 0x100, &options);

    assert!(!recovery.is_complete());
    assert_eq!(recovery.instructions(), 2);
    assert_eq!(members(&store, 0x100, 0x100), vec![0x100, 0x101]);
    assert!(store.instruction(0x104).is_none());
}

#[test]
fn function_budget() {
    let decoder = script(vec![call(0x100, 0x200), ret(0x105), ret(0x200)]);
    let options = OptionsBuilder::new().max_functions(1).build();

    let (store, recovery) = recover_with(&decoder, 0x100, &options);

    assert!(!recovery.is_complete());
    assert_eq!(recovery.functions(), &[0x100]);
    assert!(store.function(0x200).is_none());
}

#[test]
fn expired_deadline() {
    let decoder = script(vec![ret(0x100)]);
    let options = OptionsBuilder::new()
        .deadline(std::time::Duration::from_secs(0))
        .build();

    let (store, recovery) = recover_with(&decoder, 0x100, &options);

    assert!(!recovery.is_complete());
    assert!(recovery.functions().is_empty());
    assert!(store.functions().is_empty());
}

#[test]
fn claimed_call_target_is_not_split() {
    // 0x300 calls both the entry of 0x100 and an address in its only block.
    let decoder = script(vec![
        call(0x300, 0x100),
        call(0x305, 0x102),
        ret(0x30a),
        op(0x100, 1),
        op(0x101, 1),
        op(0x102, 1),
        ret(0x103),
    ]);

    let (mut store, recovery) = recover(&decoder, 0x300);

    assert_eq!(recovery.functions(), &[0x300, 0x100]);
    assert!(store.function(0x102).is_none());
    assert_eq!(store.function(0x100).unwrap().num_blocks(), 1);
    assert_eq!(
        members(&store, 0x100, 0x100),
        vec![0x100, 0x101, 0x102, 0x103]
    );
    assert_eq!(references(store.xrefs(0x102)), vec![0x305]);
    assert_eq!(store.function_of(0x102), Some(0x100));
}

#[test]
fn explicit_entry_is_always_recovered() {
    let decoder = script(vec![op(0x100, 1), op(0x101, 1), ret(0x102)]);
    let memory = MemoryImage::new();
    let options = Options::default();
    let mut store = TaggedStore::new();

    Recoverer::new(&memory, &mut store, &decoder, &options).recover(0x100);
    let recovery = Recoverer::new(&memory, &mut store, &decoder, &options).recover(0x101);

    assert_eq!(recovery.functions(), &[0x101]);
    assert_eq!(store.functions().len(), 2);
    assert_eq!(store.function_of(0x101), Some(0x101));
    // The earlier function keeps its block, and the later one claims the tags.
    assert_eq!(members(&store, 0x100, 0x100), vec![0x100, 0x101, 0x102]);
    assert_eq!(members(&store, 0x101, 0x101), vec![0x101, 0x102]);
    assert_eq!(store.record(0x102).unwrap().block(), Some(0x101));
}

#[test]
fn query_after_recovery() {
    let decoder = script(vec![call(0x100, 0x200), ret(0x105), ret(0x200)]);
    let (mut store, _) = recover(&decoder, 0x100);
    store.set_name(0x100, "main");

    let result = store.query(&[Tag::Name, Tag::Function], None);

    assert_eq!(result[&0x100][&Tag::Name], TagValue::from("main"));
    assert_eq!(result[&0x105][&Tag::Function], TagValue::Function(0x100));
    assert_eq!(result[&0x200][&Tag::Function], TagValue::Function(0x200));
    assert!(!result[&0x105].contains_key(&Tag::Name));
}

#[test]
fn callees_before_siblings() {
    // 0x100 calls 0x200 and then 0x300. 0x200 calls 0x301, which 0x300 also
    // falls through into.
    let decoder = script(vec![
        call(0x100, 0x200),
        call(0x105, 0x300),
        ret(0x10a),
        call(0x200, 0x301),
        ret(0x205),
        op(0x300, 1),
        ret(0x301),
    ]);

    let (store, recovery) = recover(&decoder, 0x100);

    assert_eq!(recovery.functions(), &[0x100, 0x200, 0x301, 0x300]);
    assert_eq!(members(&store, 0x301, 0x301), vec![0x301]);
    assert_eq!(members(&store, 0x300, 0x300), vec![0x300, 0x301]);
    // The later function claims the shared instruction.
    assert_eq!(store.function_of(0x301), Some(0x300));
}
