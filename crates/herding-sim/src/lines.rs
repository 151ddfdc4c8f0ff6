//! Flavor text pools.
//!
//! Fixed lines the simulation speaks on its own: farewells when a stay
//! ends, snark near the end of a stay, the dog's scripted nudges, and the
//! fallback reply when the judge fails.

use rand::Rng;
use rand::seq::IndexedRandom;

/// Appended to history when a convinced agent's stay runs out.
pub const FAREWELLS: &[&str] = &[
    "Well, that was nice. I've got places to be.",
    "I've seen enough of this spot. Off I go.",
    "Thirty seconds of my life I won't get back. Goodbye!",
    "Lovely. Now if you'll excuse me, I'm wandering.",
    "I stayed like you asked. Don't push your luck.",
];

/// Shown while a convinced agent's stay is nearly over.
pub const SNARKY_COMMENTS: &[&str] = &[
    "Are we done yet?",
    "My feet are getting restless...",
    "Just a few more seconds of this.",
    "I'm counting, you know.",
    "Don't get used to this.",
];

/// The herding dog's scripted nudges, spoken to the agent.
pub const DOG_MESSAGES: &[&str] = &[
    "Woof! Woof! (The dog nudges you toward the target.)",
    "Arf! (The dog circles you and looks meaningfully at the target.)",
    "Grrr... woof! (The dog herds you firmly in one direction.)",
    "Bark bark! (The dog tugs at your sleeve, urging you along.)",
];

/// The agent's reply when the judge call fails.
pub const FALLBACK_REPLY: &str = "*looks confused* Sorry, I lost my train of thought.";

/// Pick a line uniformly from `pool`.
///
/// Returns an empty string for an empty pool.
pub fn pick(pool: &[&str], rng: &mut impl Rng) -> String {
    pool.choose(rng).map_or_else(String::new, |line| (*line).to_owned())
}
