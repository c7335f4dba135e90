use std::fmt;

/// Tag identifying a category of component data. An entity holds at most one
/// component of each kind.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct ComponentKind(u16);

impl ComponentKind {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u16 {
        self.0
    }
}

impl From<u16> for ComponentKind {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component[{}]", self.0)
    }
}
