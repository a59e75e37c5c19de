use crate::error::Error;
use crate::post::PostId;
use crate::query::{Mutation, QueryKey, QuerySnapshot};
use crate::session::Viewer;
use crate::vote::{display_count, VoteState};

/// Where a post card gets the viewer from, and where its side effects go
pub trait VoteSink {
    fn viewer(&self) -> Option<Viewer>;

    /// Show a transient notice to the user
    fn notify(&self, message: String);

    /// Hand a mutation off to be executed. Returns its ticket from
    /// [QueryCache::register_mutation](crate::QueryCache::register_mutation).
    fn submit(&self, mutation: Mutation) -> Result<u64, Error>;
}

/// What happened when the user clicked a vote arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    NotSignedIn,
    AlreadyVoted,
    InFlight,
    Submitted,
    Failed,
}

/// Per-card state behind a rendered post: the viewer's vote, derived from
/// the post's vote query, and the guard against overlapping vote requests.
#[derive(Debug, Clone)]
pub struct PostCard {
    post_id: PostId,
    vote: VoteState,
    seen_generation: Option<u64>,

    // ticket of the vote we are waiting to see reflected
    pending: Option<u64>,
}

impl PostCard {
    pub fn new(post_id: PostId) -> PostCard {
        PostCard {
            post_id,
            vote: VoteState::Unknown,
            seen_generation: None,
            pending: None,
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    /// The query this card reads its votes from
    pub fn query_key(&self) -> QueryKey {
        QueryKey::VotesByPostId(self.post_id)
    }

    pub fn vote_state(&self) -> VoteState {
        self.vote
    }

    pub fn is_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Bring the card up to date with the latest vote query snapshot.
    ///
    /// Only a new generation of the query changes anything. Returns true if
    /// the viewer's vote state was recomputed.
    pub fn sync(&mut self, snapshot: Option<&QuerySnapshot>, viewer: Option<&Viewer>) -> bool {
        let snapshot = match snapshot {
            Some(s) => s,
            None => return false,
        };
        if self.seen_generation == Some(snapshot.generation) {
            return false;
        }
        self.seen_generation = Some(snapshot.generation);

        // Only data fetched after our vote finished (or failed) answers it.
        // A load that was already running when we voted does not.
        if let Some(ticket) = self.pending {
            if snapshot.mutations_applied >= ticket {
                self.pending = None;
            }
        }

        match snapshot.votes() {
            Some(votes) => {
                self.vote = VoteState::from_votes(votes, viewer.map(|v| v.name.as_str()));
                true
            }
            None => false,
        }
    }

    /// The number to show between the arrows, if votes have loaded
    pub fn display_count(snapshot: Option<&QuerySnapshot>) -> Option<i64> {
        snapshot.and_then(|s| s.votes()).map(|v| display_count(v))
    }

    /// Handle a click on the up (`true`) or down (`false`) arrow
    pub fn cast_vote(&mut self, upvote: bool, sink: &dyn VoteSink) -> VoteOutcome {
        let viewer = match sink.viewer() {
            Some(v) => v,
            None => {
                sink.notify("You need to be logged in to vote!".to_owned());
                return VoteOutcome::NotSignedIn;
            }
        };

        if self.vote.already(upvote) {
            return VoteOutcome::AlreadyVoted;
        }

        if self.pending.is_some() {
            tracing::debug!("Vote on {} still in flight, ignoring click", self.post_id);
            return VoteOutcome::InFlight;
        }

        tracing::debug!("Voting on {}...", self.post_id);
        let mutation = Mutation::AddVote {
            post_id: self.post_id,
            username: viewer.name,
            upvote,
        };
        match sink.submit(mutation) {
            Ok(ticket) => {
                self.pending = Some(ticket);
                VoteOutcome::Submitted
            }
            Err(e) => {
                tracing::error!("{}", e);
                sink.notify(format!("Vote failed: {}", e.kind));
                VoteOutcome::Failed
            }
        }
    }
}
