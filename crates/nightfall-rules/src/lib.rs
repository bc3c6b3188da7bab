//! Reference rules for Nightfall.
//!
//! [`ClassicEngine`] implements [`nightfall_room::GameEngine`] with the
//! classic werewolf rule set, so a server can run complete games out of the
//! box. Rooms only ever talk to it through the trait.
//!
//! # Rules
//!
//! | Phase | Who acts | Resolution |
//! |-------|----------|------------|
//! | Night | werewolves `kill`, seer `check`, guard `protect` | most-voted victim, ties go to the latest vote |
//! | Witch | witch `antidote` (tonight's victim) or `poison` | each potion once per game, one per night |
//! | Day   | everyone alive may `speak` | deaths from the night land at dawn |
//! | Vote  | everyone alive may `vote` | strict plurality is exiled, ties exile nobody |
//!
//! Good wins when no werewolf is alive. Evil wins when living werewolves
//! are at least as many as living good players. Both are checked after
//! every resolution.

mod classic;
mod tally;

pub use classic::{ClassicEngine, camp_of};
