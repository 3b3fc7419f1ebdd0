//! Recursive-descent recovery of functions and basic blocks.
//!
//! Recovery of a function happens in three passes:
//!
//! 1. Starting at the entry, decode instructions breadth-first along every
//!    jump, branch and fallthrough. Calls are not followed, but their targets
//!    are remembered. Every jump or branch which does not simply fall through
//!    marks its target as the start of a block, and records a cross reference.
//! 2. Walk forward from each block start over the decoded instructions until
//!    flow ends or the next block starts.
//! 3. Recover every call target which does not yet belong to a function the
//!    same way, depth first: the functions a callee calls are recovered before
//!    its siblings.
//!
//! Which functions are found depends on that order. A sibling recovered
//! first may fall through or jump into an address another function calls,
//! and that address is then never recovered as a function of its own.
//!
//! Blocks are final once a function is recovered. If a function recovered
//! later jumps into the middle of one, that block is not split.
//!
//! Everything learned is written to the [`TaggedStore`]: `instruction`, `len`
//! and `function` for each decoded address, `block` for each address placed in
//! a block, and `crefs`/`xrefs` on the targets of branches and calls. Recovered
//! functions are kept in the store's globals.

mod options;

#[cfg(test)]
mod test;

pub use self::options::{Options, OptionsBuilder};

use crate::cfg::{Block, Function};
use crate::decoder::{Decoder, DestinationType, DECODE_WINDOW};
use crate::memory::MemoryImage;
use crate::store::TaggedStore;
use log::{debug, trace, warn};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use std::time::Instant;

/// What one call to recover did.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Recovery {
    functions: Vec<u64>,
    blocks: usize,
    instructions: usize,
    complete: bool,
}

impl Recovery {
    fn new() -> Recovery {
        Recovery {
            functions: Vec::new(),
            blocks: 0,
            instructions: 0,
            complete: true,
        }
    }

    /// Entries of the functions recovered, in the order they were recovered.
    pub fn functions(&self) -> &[u64] {
        &self.functions
    }

    /// The number of blocks created.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// The number of instructions decoded.
    pub fn instructions(&self) -> usize {
        self.instructions
    }

    /// False if a budget in `Options` stopped recovery early.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Drives a `Decoder` over a `MemoryImage`, writing what it finds to a
/// `TaggedStore`.
pub struct Recoverer<'r> {
    memory: &'r MemoryImage,
    store: &'r mut TaggedStore,
    decoder: &'r dyn Decoder,
    options: &'r Options,
    started: Instant,
    recovery: Recovery,
}

impl<'r> Recoverer<'r> {
    pub fn new(
        memory: &'r MemoryImage,
        store: &'r mut TaggedStore,
        decoder: &'r dyn Decoder,
        options: &'r Options,
    ) -> Recoverer<'r> {
        Recoverer {
            memory,
            store,
            decoder,
            options,
            started: Instant::now(),
            recovery: Recovery::new(),
        }
    }

    /// Recover the function at `entry`, and every function it reaches
    /// through calls.
    ///
    /// `entry` is always recovered, even if it already belongs to a function.
    /// Call targets are only recovered if they do not.
    pub fn recover(mut self, entry: u64) -> Recovery {
        let mut pending = Vec::new();
        self.recover_pending(entry, &mut pending);

        while let Some(address) = pending.pop() {
            if !self.recovery.complete {
                break;
            }
            if let Some(owner) = self.store.function_of(address) {
                trace!("0x{:x} already belongs to 0x{:x}", address, owner);
                continue;
            }
            self.recover_pending(address, &mut pending);
        }

        debug!(
            "recovered {} functions, {} blocks, {} instructions from 0x{:x}",
            self.recovery.functions.len(),
            self.recovery.blocks,
            self.recovery.instructions,
            entry
        );

        self.recovery
    }

    /// Recover the function at `address` if the budget allows, queueing its
    /// call targets.
    fn recover_pending(&mut self, address: u64, pending: &mut Vec<u64>) {
        if self.out_of_functions() || self.out_of_budget() {
            self.stop(pending.len() + 1);
            return;
        }

        let function_starts = self.recover_function(address);
        if self.options.recurse() {
            // lowest target on top
            pending.extend(function_starts.into_iter().rev());
        }
    }

    /// Recover the one function at `entry`, returning the targets of its calls.
    fn recover_function(&mut self, entry: u64) -> BTreeSet<u64> {
        debug!("recovering function at 0x{:x}", entry);

        self.store.insert_function(Function::new(entry));
        self.recovery.functions.push(entry);

        let mut block_starts = BTreeSet::new();
        block_starts.insert(entry);
        let mut function_starts = BTreeSet::new();

        let mut queue = VecDeque::new();
        let mut visited = FxHashSet::default();
        queue.push_back(entry);
        visited.insert(entry);

        // decode everything reachable without following calls
        while let Some(address) = queue.pop_front() {
            if self.out_of_budget() {
                self.stop(queue.len() + 1);
                break;
            }

            for (destination, type_, next) in self.decode(address, entry) {
                match type_ {
                    DestinationType::Call => {
                        function_starts.insert(destination);
                        self.store.xrefs(destination).insert(address);
                    }
                    DestinationType::ControlFlow => {
                        if destination != next {
                            self.store.crefs(destination).insert(address);
                            block_starts.insert(destination);
                        }
                        if visited.insert(destination) {
                            queue.push_back(destination);
                        }
                    }
                }
            }
        }

        // split what was decoded into blocks
        for &start in &block_starts {
            let block = self.find_block(start, &block_starts);
            self.recovery.blocks += 1;
            if let Some(function) = self.store.globals_mut().function_mut(entry) {
                function.add_block(block);
            }
        }

        function_starts
    }

    /// Decode and tag the instruction at `address` for the function at
    /// `function`.
    ///
    /// Returns each destination with its type and the address directly after
    /// the instruction.
    fn decode(&mut self, address: u64, function: u64) -> Vec<(u64, DestinationType, u64)> {
        let bytes = self.memory.read(address, DECODE_WINDOW);
        let architecture = self.store.architecture(address);
        let instruction = self.decoder.decode(&bytes, address, architecture);
        self.recovery.instructions += 1;

        if instruction.is_valid() {
            trace!("0x{:x}: {}", address, instruction);
        } else {
            trace!("0x{:x}: undecodable ({} bytes available)", address, bytes.len());
        }

        let next = instruction.next_address();
        let destinations = instruction
            .destinations()
            .iter()
            .map(|&(destination, type_)| (destination, type_, next))
            .collect();

        let record = self.store.record_mut(address);
        record.set_len(instruction.size() as u64);
        record.set_function(function);
        record.set_instruction(instruction);

        destinations
    }

    /// Build the block starting at `start`, tagging each of its addresses.
    fn find_block(&mut self, start: u64, block_starts: &BTreeSet<u64>) -> Block {
        let mut block = Block::new(start);
        self.store.record_mut(start).set_block(start);

        let mut address = start;
        loop {
            let next = match self.store.instruction(address) {
                Some(instruction) if !instruction.is_terminal() => instruction.next_address(),
                _ => break,
            };
            if next <= address
                || block_starts.contains(&next)
                || self.store.instruction(next).is_none()
            {
                break;
            }
            address = next;
            block.add(address);
            self.store.record_mut(address).set_block(start);
        }

        block
    }

    fn out_of_budget(&self) -> bool {
        if let Some(deadline) = self.options.deadline() {
            if self.started.elapsed() >= deadline {
                return true;
            }
        }
        match self.options.max_instructions() {
            Some(max_instructions) => self.recovery.instructions >= max_instructions,
            None => false,
        }
    }

    fn out_of_functions(&self) -> bool {
        match self.options.max_functions() {
            Some(max_functions) => self.recovery.functions.len() >= max_functions,
            None => false,
        }
    }

    fn stop(&mut self, abandoned: usize) {
        if self.recovery.complete {
            warn!(
                "recovery budget exhausted after {} functions and {} instructions, \
                 abandoning {} pending addresses",
                self.recovery.functions.len(),
                self.recovery.instructions,
                abandoned
            );
        }
        self.recovery.complete = false;
    }
}
