use near_sdk::{env, near_bindgen, AccountId};

use crate::*;

#[near_bindgen]
impl Contract {
    /**********
     * QUERIES
     **********/

    /// Returns subjects in the registration order, paginated.
    /// * `from_index`: index of the first subject, default 0.
    /// * `limit`: max amount of subjects returned, default all.
    pub fn get_subjects(&self, from_index: Option<u32>, limit: Option<u32>) -> Vec<Subject> {
        paginate(self.registry.subjects().iter().cloned(), from_index, limit)
    }

    /// Returns the subject registered by `address`.
    /// Returns an empty subject (`name: ""`, `votes: 0`) if there is no such subject.
    pub fn get_subject(&self, address: AccountId) -> Subject {
        self.registry.subject(&address)
    }

    /// Returns subjects ordered by votes (descending), ties keep the registration order.
    /// `from_index` and `limit` page through the ordered list.
    /// Fails if the voting has not ended yet.
    #[handle_result]
    pub fn get_results(
        &self,
        from_index: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<Subject>, D21Error> {
        let results = self.registry.results(env::block_timestamp_ms())?;
        Ok(paginate(results.into_iter(), from_index, limit))
    }

    /// Remaining voting time in milliseconds, 0 once voting has ended.
    #[handle_result]
    pub fn get_remaining_time(&self) -> Result<u64, D21Error> {
        self.registry.remaining_time(env::block_timestamp_ms())
    }

    pub fn owner(&self) -> AccountId {
        self.registry.owner().clone()
    }

    pub fn config(&self) -> Config {
        self.registry.config()
    }

    pub fn is_voter(&self, account: AccountId) -> bool {
        self.registry.is_voter(&account)
    }

    pub fn voting_started(&self) -> bool {
        self.registry.voting_started()
    }

    /// Unix time in milliseconds, 0 if voting has not started.
    pub fn voting_end_time(&self) -> u64 {
        self.registry.voting_end_time()
    }

    pub fn has_voted(&self, voter: AccountId, subject: AccountId) -> bool {
        self.registry.has_voted(&voter, &subject)
    }

    /// Number of positive votes cast by `voter`.
    pub fn positive_votes(&self, voter: AccountId) -> u8 {
        self.registry.positive_votes(&voter)
    }
}

fn paginate<T>(
    items: impl Iterator<Item = T>,
    from_index: Option<u32>,
    limit: Option<u32>,
) -> Vec<T> {
    let limit = limit.map_or(usize::MAX, |l| l as usize);
    items
        .skip(from_index.unwrap_or(0) as usize)
        .take(limit)
        .collect()
}
