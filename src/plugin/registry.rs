use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use super::Plugin;
use crate::error::PluginError;
use crate::event::{Notification, Topic};
use crate::session::EditorSession;

#[derive(Clone)]
struct PluginEntry {
    name: String,
    /// Handler table captured at registration
    topics: HashSet<Topic>,
    plugin: Rc<RefCell<dyn Plugin>>,
}

/// Shared handle to a registered plugin
#[derive(Clone)]
pub struct PluginRef {
    name: String,
    plugin: Rc<RefCell<dyn Plugin>>,
}

impl std::fmt::Debug for PluginRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRef").field("name", &self.name).finish()
    }
}

impl PluginRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `f` on the plugin if it is a `T`.
    ///
    /// Returns `None` if the plugin has another type or is busy handling a notification.
    pub fn with<T: Plugin, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut plugin = self.plugin.try_borrow_mut().ok()?;
        plugin.as_any_mut().downcast_mut::<T>().map(f)
    }

    pub fn is<T: Plugin>(&self) -> bool {
        self.plugin
            .try_borrow()
            .is_ok_and(|plugin| plugin.as_any().is::<T>())
    }
}

/// Owns the plugins of one session, keyed by name, in registration order
#[derive(Default)]
pub struct PluginRegistry {
    entries: RefCell<Vec<PluginEntry>>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `plugin` under `name` and run its `init` hook.
    ///
    /// A taken name is an error and the new plugin is never initialized. If
    /// `init` fails, nothing is registered.
    pub fn register<P: Plugin>(
        &self,
        session: &EditorSession,
        name: impl Into<String>,
        plugin: P,
    ) -> Result<PluginRef, PluginError> {
        let name = name.into();
        if self.contains(&name) {
            log::warn!("Plugin '{}' already exists", name);
            return Err(PluginError::DuplicatePlugin(name));
        }

        let plugin: Rc<RefCell<dyn Plugin>> = Rc::new(RefCell::new(plugin));
        let init = plugin.borrow_mut().init(session);
        if let Err(source) = init {
            log::error!("Plugin '{}' failed to initialize: {}", name, source);
            return Err(PluginError::PluginInit { name, source });
        }

        // init may have registered the same name through the session
        if self.contains(&name) {
            log::warn!("Plugin '{}' was registered during its own init", name);
            plugin.borrow_mut().destroy(session);
            return Err(PluginError::DuplicatePlugin(name));
        }

        let topics: HashSet<Topic> = plugin.borrow().topics().into_iter().collect();
        log::info!("Registered plugin '{}' handling {} topic(s)", name, topics.len());
        self.entries.borrow_mut().push(PluginEntry {
            name: name.clone(),
            topics,
            plugin: Rc::clone(&plugin),
        });
        Ok(PluginRef { name, plugin })
    }

    pub fn get(&self, name: &str) -> Option<PluginRef> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| PluginRef {
                name: entry.name.clone(),
                plugin: Rc::clone(&entry.plugin),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().iter().any(|entry| entry.name == name)
    }

    /// Plugin names in registration order
    pub fn names(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|entry| entry.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Deliver `notification` to every plugin handling its topic, in registration order.
    ///
    /// Handler errors are logged per plugin and never stop the dispatch. A
    /// plugin that is itself mid-handler (the notification was caused by its
    /// own call back into the session) is skipped. Returns the number of
    /// plugins that received the notification.
    pub fn notify(&self, session: &EditorSession, notification: &Notification) -> usize {
        let topic = notification.topic();
        let targets: Vec<PluginEntry> = self
            .entries
            .borrow()
            .iter()
            .filter(|entry| entry.topics.contains(&topic))
            .cloned()
            .collect();

        let mut delivered = 0;
        for entry in targets {
            if !self.is_registered(&entry.plugin) {
                continue;
            }
            let Ok(mut plugin) = entry.plugin.try_borrow_mut() else {
                log::debug!("Skipping re-entrant '{}' dispatch to plugin '{}'", topic, entry.name);
                continue;
            };

            delivered += 1;
            if let Err(source) = plugin.on_notification(session, notification) {
                let err = PluginError::PluginHandler {
                    name: entry.name.clone(),
                    topic: topic.to_string(),
                    source,
                };
                log::error!("{}", err);
            }
        }
        delivered
    }

    /// Remove one plugin, calling its `destroy` hook. Returns false for unknown names.
    pub fn unregister(&self, session: &EditorSession, name: &str) -> bool {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let Some(index) = entries.iter().position(|entry| entry.name == name) else {
                return false;
            };
            entries.remove(index)
        };
        Self::destroy_entry(session, &removed);
        true
    }

    /// Call every plugin's `destroy` hook, in registration order, then clear the registry
    pub fn unregister_all(&self, session: &EditorSession) {
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        for entry in &entries {
            Self::destroy_entry(session, entry);
        }
    }

    fn destroy_entry(session: &EditorSession, entry: &PluginEntry) {
        match entry.plugin.try_borrow_mut() {
            Ok(mut plugin) => {
                plugin.destroy(session);
                log::info!("Unregistered plugin '{}'", entry.name);
            }
            Err(_) => log::warn!("Plugin '{}' removed while busy; destroy hook skipped", entry.name),
        }
    }

    fn is_registered(&self, plugin: &Rc<RefCell<dyn Plugin>>) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|entry| Rc::ptr_eq(&entry.plugin, plugin))
    }
}
