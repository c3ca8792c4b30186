use uuid::Uuid;

/// Supplies opaque identifiers for new nodes.
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

/// Random v4 UUIDs in simple (hyphen-less) form.
#[derive(Debug, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Predictable `prefix-N` identifiers.
#[cfg(test)]
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

#[cfg(test)]
impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

#[cfg(test)]
impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
