//! Script grouping for merged builds
//!
//! Scripts without a recognised `type` go to the **server** group. Shared
//! scripts stay in their own bucket and are folded into both effective sets
//! when compiling, never duplicated in the manifest.

use crate::manifest::catalog::FileReference;
use crate::manifest::rewrite::MergedTargets;

pub use crate::manifest::Audience;

/// Lua scripts of one resource, split by declared audience.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptGroups<'a> {
    pub client: Vec<&'a FileReference>,
    pub server: Vec<&'a FileReference>,
    pub shared: Vec<&'a FileReference>,
    /// Every grouped script in declaration order.
    ordered: Vec<&'a FileReference>,
}

impl<'a> ScriptGroups<'a> {
    /// Single pass over the references; non-`.lua` scripts are skipped.
    pub fn group(references: &'a [FileReference]) -> Self {
        let mut groups = ScriptGroups::default();

        for reference in references.iter().filter(|r| r.is_lua_script()) {
            match reference.audience.unwrap_or(Audience::Unspecified) {
                Audience::Client => groups.client.push(reference),
                Audience::Shared => groups.shared.push(reference),
                Audience::Server | Audience::Unspecified => groups.server.push(reference),
            }
            groups.ordered.push(reference);
        }

        groups
    }

    /// Client and shared scripts, in declaration order.
    pub fn effective_client(&self) -> Vec<&'a FileReference> {
        self.effective(Audience::Client)
    }

    /// Server, shared and untyped scripts, in declaration order.
    pub fn effective_server(&self) -> Vec<&'a FileReference> {
        self.effective(Audience::Server)
    }

    fn effective(&self, side: Audience) -> Vec<&'a FileReference> {
        self.ordered
            .iter()
            .copied()
            .filter(|r| {
                let audience = r.audience.unwrap_or(Audience::Unspecified);
                match side {
                    Audience::Client => matches!(audience, Audience::Client | Audience::Shared),
                    _ => !matches!(audience, Audience::Client),
                }
            })
            .collect()
    }

    /// Which merged entries the manifest should declare.
    pub fn targets(&self) -> MergedTargets {
        MergedTargets {
            client: !self.client.is_empty() || !self.shared.is_empty(),
            server: !self.server.is_empty() || !self.shared.is_empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
