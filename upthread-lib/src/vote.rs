use serde::{Deserialize, Serialize};

/// One user's vote on one post. The backend keeps at most one of these per
/// (post, username); voting again replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub username: String,
    pub upvote: bool,
}

impl Vote {
    pub fn new(username: &str, upvote: bool) -> Vote {
        Vote {
            username: username.to_owned(),
            upvote,
        }
    }

    fn weight(&self) -> i64 {
        if self.upvote {
            1
        } else {
            -1
        }
    }
}

/// How the viewer has voted on a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoteState {
    /// Votes have not been loaded yet
    #[default]
    Unknown,
    NotVoted,
    Upvoted,
    Downvoted,
}

impl VoteState {
    /// Find the viewer's vote in the collection
    pub fn from_votes(votes: &[Vote], viewer: Option<&str>) -> VoteState {
        let viewer = match viewer {
            Some(name) => name,
            None => return VoteState::NotVoted,
        };
        match votes.iter().find(|v| v.username == viewer) {
            Some(v) if v.upvote => VoteState::Upvoted,
            Some(_) => VoteState::Downvoted,
            None => VoteState::NotVoted,
        }
    }

    pub fn is_upvoted(&self) -> bool {
        *self == VoteState::Upvoted
    }

    pub fn is_downvoted(&self) -> bool {
        *self == VoteState::Downvoted
    }

    /// Whether voting in this direction would change nothing
    pub fn already(&self, upvote: bool) -> bool {
        match self {
            VoteState::Upvoted => upvote,
            VoteState::Downvoted => !upvote,
            _ => false,
        }
    }
}

/// The plain signed sum: +1 per upvote, -1 per downvote
pub fn tally(votes: &[Vote]) -> i64 {
    votes.iter().map(Vote::weight).sum()
}

/// The number shown between the vote arrows.
///
/// Zero only when there are no votes at all. When the votes cancel out,
/// the direction of the first vote decides the sign.
pub fn display_count(votes: &[Vote]) -> i64 {
    let first = match votes.first() {
        Some(v) => v,
        None => return 0,
    };
    match tally(votes) {
        0 => first.weight(),
        n => n,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn votes(list: &[(&str, bool)]) -> Vec<Vote> {
        list.iter().map(|(u, up)| Vote::new(u, *up)).collect()
    }

    #[test]
    fn test_display_count_empty() {
        assert_eq!(display_count(&[]), 0);
    }

    #[test]
    fn test_display_count_tie_uses_first_vote() {
        let v = votes(&[("u1", true), ("u2", false)]);
        assert_eq!(tally(&v), 0);
        assert_eq!(display_count(&v), 1);

        let v = votes(&[("u2", false), ("u1", true)]);
        assert_eq!(display_count(&v), -1);

        let v = votes(&[("a", false), ("b", true), ("c", true), ("d", false)]);
        assert_eq!(display_count(&v), -1);
    }

    #[test]
    fn test_display_count_plain_sum() {
        let v = votes(&[("u1", true), ("u2", true), ("u3", false)]);
        assert_eq!(display_count(&v), 1);

        let v = votes(&[("u1", false), ("u2", false), ("u3", false)]);
        assert_eq!(display_count(&v), -3);
    }

    #[test]
    fn test_display_count_never_zero_with_votes() {
        // every combination of up to six votes
        for len in 1..=6usize {
            for bits in 0..(1u32 << len) {
                let v: Vec<Vote> = (0..len)
                    .map(|i| Vote::new(&format!("u{i}"), bits & (1 << i) != 0))
                    .collect();
                let shown = display_count(&v);
                assert_ne!(shown, 0);
                if tally(&v) != 0 {
                    assert_eq!(shown, tally(&v));
                }
            }
        }
    }

    #[test]
    fn test_viewer_vote_state() {
        let v = votes(&[("u1", true), ("u2", false)]);
        assert_eq!(VoteState::from_votes(&v, Some("u1")), VoteState::Upvoted);
        assert_eq!(VoteState::from_votes(&v, Some("u2")), VoteState::Downvoted);
        assert_eq!(VoteState::from_votes(&v, Some("u3")), VoteState::NotVoted);
        assert_eq!(VoteState::from_votes(&v, None), VoteState::NotVoted);
        assert_eq!(VoteState::from_votes(&[], Some("u1")), VoteState::NotVoted);
    }

    #[test]
    fn test_already() {
        assert!(VoteState::Upvoted.already(true));
        assert!(!VoteState::Upvoted.already(false));
        assert!(VoteState::Downvoted.already(false));
        assert!(!VoteState::NotVoted.already(true));
        assert!(!VoteState::Unknown.already(false));
    }
}
