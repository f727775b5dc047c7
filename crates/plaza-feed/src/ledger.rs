//! Reaction ledger
//!
//! Applies a viewer's reaction change to a single post's tallies. The
//! transition is its own inverse: applying `(previous, new)` after
//! `(new, previous)` restores the post, which is what rollback relies on.

use crate::model::{Post, ReactionKind};

/// Apply a reaction change and return the updated post.
///
/// - `previous` (if set and counted) loses one.
/// - `new` (if set) gains one.
/// - The viewer's reaction becomes `new`.
pub fn apply_reaction_change(
    post: &Post,
    new_reaction: Option<ReactionKind>,
    previous_reaction: Option<ReactionKind>,
) -> Post {
    let mut next = post.clone();
    apply_reaction_change_in_place(&mut next, new_reaction, previous_reaction);
    next
}

/// In-place form of [`apply_reaction_change`]. Touches only the reaction
/// tallies and the viewer's reaction.
pub fn apply_reaction_change_in_place(
    post: &mut Post,
    new_reaction: Option<ReactionKind>,
    previous_reaction: Option<ReactionKind>,
) {
    if let Some(previous) = previous_reaction {
        post.reaction_counts.decrement(previous);
    }
    if let Some(new) = new_reaction {
        post.reaction_counts.increment(new);
    }
    post.user_reaction = new_reaction;
}
