//! The `Command` trait and composite commands.

use tracing::debug;

use crate::core::EngineResult;
use crate::objects::ObjectManager;

/// An undoable change to an `ObjectManager`.
///
/// `execute` and `unexecute` are paired 1:1. After `execute` followed by
/// `unexecute` the manager is observably identical to its prior state
/// (same snapshot, same id allocators, same RNG position). A command runs
/// completely or fails without leaving partial changes behind.
pub trait Command: Send + std::fmt::Debug {
    fn execute(&mut self, manager: &mut ObjectManager) -> EngineResult<()>;

    fn unexecute(&mut self, manager: &mut ObjectManager) -> EngineResult<()>;

    /// True when executing this command changes nothing.
    fn is_empty(&self) -> bool {
        false
    }

    /// Short description for logs.
    fn describe(&self) -> String {
        format!("{self:?}")
    }
}

/// Ordered group of commands undone as one.
///
/// Children execute in order and unexecute in reverse order.
#[derive(Debug, Default)]
pub struct MultiCommand {
    children: Vec<Box<dyn Command>>,
    /// Children executed so far; everything before this index is applied.
    executed: usize,
}

impl MultiCommand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already-constructed children (not yet executed).
    #[must_use]
    pub fn from_commands(children: Vec<Box<dyn Command>>) -> Self {
        Self { children, executed: 0 }
    }

    /// Append a child that has already been executed against the manager.
    pub(crate) fn push_executed(&mut self, command: Box<dyn Command>) {
        debug_assert_eq!(self.executed, self.children.len());
        self.children.push(command);
        self.executed = self.children.len();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Number of children, not emptiness in the `Command` sense.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn children(&self) -> impl Iterator<Item = &dyn Command> {
        self.children.iter().map(|c| c.as_ref())
    }

    fn roll_back(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        while self.executed > 0 {
            self.executed -= 1;
            self.children[self.executed].unexecute(manager)?;
        }
        Ok(())
    }
}

impl Command for MultiCommand {
    fn execute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        while self.executed < self.children.len() {
            if let Err(err) = self.children[self.executed].execute(manager) {
                debug!(failed = self.executed, %err, "composite command failed, rolling back");
                self.roll_back(manager)?;
                return Err(err);
            }
            self.executed += 1;
        }
        Ok(())
    }

    fn unexecute(&mut self, manager: &mut ObjectManager) -> EngineResult<()> {
        self.roll_back(manager)
    }

    fn is_empty(&self) -> bool {
        self.children.iter().all(|c| c.is_empty())
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.children.iter().map(|c| c.describe()).collect();
        format!("[{}]", parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::core::{EngineConfig, EngineError};
    use crate::properties::PropertyRegistry;

    #[derive(Debug)]
    struct Noop;

    impl Command for Noop {
        fn execute(&mut self, _: &mut ObjectManager) -> EngineResult<()> {
            Ok(())
        }
        fn unexecute(&mut self, _: &mut ObjectManager) -> EngineResult<()> {
            Ok(())
        }
        fn is_empty(&self) -> bool {
            true
        }
    }

    #[derive(Debug)]
    struct Real;

    impl Command for Real {
        fn execute(&mut self, _: &mut ObjectManager) -> EngineResult<()> {
            Ok(())
        }
        fn unexecute(&mut self, _: &mut ObjectManager) -> EngineResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_empty_iff_all_children_empty() {
        assert!(MultiCommand::new().is_empty());
        assert!(MultiCommand::from_commands(vec![Box::new(Noop), Box::new(Noop)]).is_empty());
        assert!(!MultiCommand::from_commands(vec![Box::new(Noop), Box::new(Real)]).is_empty());
    }

    #[test]
    fn test_nested_composite_emptiness() {
        let inner = MultiCommand::from_commands(vec![Box::new(Noop)]);
        let outer = MultiCommand::from_commands(vec![Box::new(inner), Box::new(Noop)]);
        assert!(outer.is_empty());
        assert_eq!(outer.len(), 2);
    }

    #[test]
    fn test_describe_lists_children() {
        let multi = MultiCommand::from_commands(vec![Box::new(Noop), Box::new(Real)]);
        assert_eq!(multi.describe(), "[Noop; Real]");
    }

    #[derive(Debug)]
    struct Recording {
        tag: u8,
        log: Arc<Mutex<Vec<(bool, u8)>>>,
        fail: bool,
    }

    impl Command for Recording {
        fn execute(&mut self, _: &mut ObjectManager) -> EngineResult<()> {
            if self.fail {
                return Err(EngineError::command_state("recording", "told to fail"));
            }
            self.log.lock().unwrap().push((true, self.tag));
            Ok(())
        }
        fn unexecute(&mut self, _: &mut ObjectManager) -> EngineResult<()> {
            self.log.lock().unwrap().push((false, self.tag));
            Ok(())
        }
    }

    fn recording(tag: u8, log: &Arc<Mutex<Vec<(bool, u8)>>>, fail: bool) -> Box<dyn Command> {
        Box::new(Recording { tag, log: Arc::clone(log), fail })
    }

    #[test]
    fn test_unexecute_is_lifo() {
        let mut manager = ObjectManager::new(PropertyRegistry::shared(), &EngineConfig::default());
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut multi = MultiCommand::from_commands(vec![
            recording(1, &log, false),
            recording(2, &log, false),
            recording(3, &log, false),
        ]);

        multi.execute(&mut manager).unwrap();
        multi.unexecute(&mut manager).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![(true, 1), (true, 2), (true, 3), (false, 3), (false, 2), (false, 1)]
        );
    }

    #[test]
    fn test_failed_child_rolls_back_prefix() {
        let mut manager = ObjectManager::new(PropertyRegistry::shared(), &EngineConfig::default());
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut multi = MultiCommand::from_commands(vec![
            recording(1, &log, false),
            recording(2, &log, false),
            recording(3, &log, true),
        ]);

        assert!(multi.execute(&mut manager).is_err());
        assert_eq!(
            *log.lock().unwrap(),
            vec![(true, 1), (true, 2), (false, 2), (false, 1)]
        );
    }
}
