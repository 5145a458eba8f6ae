//! Ordered consumption of a context tree by the writing-side passes.
//!
//! The serialiser, bit counter and offset attributor all walk a supplied
//! context in grammar order: each target keeps a cursor so repeated visits
//! consume successive values. Nested contexts are entered by temporarily
//! taking the child out of its slot and restored on exit, so a completed
//! pass hands the context back untouched.

use std::collections::HashMap;
use std::mem;

use crate::context::{Context, Value};
use crate::error::{Result, SerdesError};

struct Frame {
    context: Context,
    cursors: HashMap<String, usize>,
    /// Slot in the parent frame this context was taken from.
    slot: Option<(String, usize)>,
}

impl Frame {
    fn new(context: Context, slot: Option<(String, usize)>) -> Self {
        Frame {
            context,
            cursors: HashMap::new(),
            slot,
        }
    }

    fn verify_consumed(&self) -> Result<()> {
        for (name, values) in self.context.iter() {
            let used = self.cursors.get(name).copied().unwrap_or(0);
            if used != values.len() {
                return Err(SerdesError::ContextMismatch(format!(
                    "{} unused value(s) left for target {name:?}",
                    values.len() - used
                )));
            }
        }
        Ok(())
    }
}

pub(crate) struct ContextConsumer {
    stack: Vec<Frame>,
}

impl ContextConsumer {
    pub fn new(context: Context) -> Self {
        ContextConsumer {
            stack: vec![Frame::new(context, None)],
        }
    }

    fn frame(&mut self) -> &mut Frame {
        self.stack.last_mut().expect("consumer stack is never empty")
    }

    /// Consume the next value of `target`, returning its sequence index.
    pub fn next_indexed(&mut self, target: &str) -> Result<(usize, &Value)> {
        let frame = self.frame();
        let available = frame.context.get(target).map_or(0, |values| values.len());
        let cursor = frame.cursors.entry(target.to_string()).or_insert(0);
        if *cursor >= available {
            return Err(SerdesError::ContextMismatch(format!(
                "no value left for target {target:?} (have {available})"
            )));
        }
        let index = *cursor;
        *cursor += 1;
        Ok((index, frame.context.value(target, index).unwrap()))
    }

    pub fn next_value(&mut self, target: &str) -> Result<&Value> {
        self.next_indexed(target).map(|(_, value)| value)
    }

    pub fn next_uint(&mut self, target: &str) -> Result<u64> {
        match self.next_value(target)? {
            Value::UInt(v) => Ok(*v),
            other => Err(crate::serdes::type_mismatch(target, "unsigned integer", other)),
        }
    }

    pub fn next_sint(&mut self, target: &str) -> Result<i64> {
        match self.next_value(target)? {
            Value::SInt(v) => Ok(*v),
            other => Err(crate::serdes::type_mismatch(target, "signed integer", other)),
        }
    }

    pub fn next_bool(&mut self, target: &str) -> Result<bool> {
        match self.next_value(target)? {
            Value::Bool(v) => Ok(*v),
            other => Err(crate::serdes::type_mismatch(target, "boolean", other)),
        }
    }

    /// Descend into the next nested context stored at `target`.
    pub fn enter_nested(&mut self, target: &str) -> Result<()> {
        let (index, value) = self.next_indexed(target)?;
        if !matches!(value, Value::Context(_)) {
            return Err(crate::serdes::type_mismatch(target, "nested context", value));
        }
        let frame = self.frame();
        let slot = frame.context.value_mut(target, index).unwrap();
        let Value::Context(child) = mem::replace(slot, Value::Context(Context::new())) else {
            unreachable!("checked above");
        };
        self.stack
            .push(Frame::new(child, Some((target.to_string(), index))));
        Ok(())
    }

    /// Leave the current nested context, restoring it into its parent.
    ///
    /// Fails with `ContextMismatch` if the grammar left values unconsumed.
    pub fn exit_nested(&mut self) -> Result<()> {
        debug_assert!(self.stack.len() > 1, "exit_nested without enter_nested");
        let frame = self.stack.pop().expect("consumer stack is never empty");
        frame.verify_consumed()?;
        let (target, index) = frame.slot.expect("nested frames always have a slot");
        let parent = self.frame();
        *parent.context.value_mut(&target, index).unwrap() = Value::Context(frame.context);
        Ok(())
    }

    /// Verify everything was consumed and hand the context back.
    pub fn finish(mut self) -> Result<Context> {
        debug_assert_eq!(self.stack.len(), 1, "finish with nested frames open");
        let frame = self.stack.pop().expect("consumer stack is never empty");
        frame.verify_consumed()?;
        Ok(frame.context)
    }
}
