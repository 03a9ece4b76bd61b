//! Named trace flags, settable at runtime through `monitor set debug`.

/// A registry of named boolean trace flags.
///
/// The server consults the `rsp` flag for its own packet tracing; the other
/// built-in flags exist for the transport and target implementations that
/// share the registry. Additional flags can be registered at construction
/// time with [`TraceFlags::with_flag`].
///
/// Flags are listed by `monitor show debug` in registration order.
#[derive(Debug, Clone)]
pub struct TraceFlags {
    flags: Vec<(String, bool)>,
}

const BUILTIN_FLAGS: &[&str] = &["rsp", "conn", "break", "exec"];

impl TraceFlags {
    /// Create the registry with the built-in flags, all off.
    pub fn new() -> Self {
        TraceFlags {
            flags: BUILTIN_FLAGS.iter().map(|n| (n.to_string(), false)).collect(),
        }
    }

    /// Register an additional flag, initially off. Registering an existing
    /// name is a no-op.
    pub fn with_flag(mut self, name: &str) -> Self {
        if !self.is_flag(name) {
            self.flags.push((name.to_string(), false));
        }
        self
    }

    /// Is `name` a known flag?
    pub fn is_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|(n, _)| n == name)
    }

    /// The current value of `name`. Unknown flags read as off.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.iter().any(|(n, v)| n == name && *v)
    }

    /// Set `name` to `value`, returning `false` for an unknown flag.
    pub fn set_flag(&mut self, name: &str, value: bool) -> bool {
        match self.flags.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => {
                *v = value;
                true
            }
            None => false,
        }
    }

    /// Flag names, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(|(n, _)| n.as_str())
    }
}

impl Default for TraceFlags {
    fn default() -> Self {
        TraceFlags::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_flags_start_off() {
        let flags = TraceFlags::new();
        for name in flags.iter() {
            assert!(!flags.flag(name));
        }
        assert!(flags.is_flag("rsp"));
        assert!(!flags.is_flag("nonsense"));
    }

    #[test]
    fn set_and_clear() {
        let mut flags = TraceFlags::new();
        assert!(flags.set_flag("rsp", true));
        assert!(flags.flag("rsp"));
        assert!(flags.set_flag("rsp", false));
        assert!(!flags.flag("rsp"));
        assert!(!flags.set_flag("nonsense", true));
    }

    #[test]
    fn custom_flags_register_once() {
        let flags = TraceFlags::new().with_flag("vcd").with_flag("vcd");
        assert_eq!(flags.iter().filter(|n| *n == "vcd").count(), 1);
        assert!(flags.is_flag("vcd"));
    }

    #[test]
    fn iteration_preserves_registration_order() {
        let flags = TraceFlags::new().with_flag("vcd");
        let names: Vec<&str> = flags.iter().collect();
        assert_eq!(names, ["rsp", "conn", "break", "exec", "vcd"]);
    }
}
