use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealFriendService {
    profile_repo: Arc<dyn ProfileRepo>,
    friendship_repo: Arc<dyn FriendshipRepo>,
    apply_repo: Arc<dyn ApplyRepo>,
    notice: Arc<dyn NoticePort>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealFriendService {
    pub fn new(
        profile_repo: Arc<dyn ProfileRepo>,
        friendship_repo: Arc<dyn FriendshipRepo>,
        apply_repo: Arc<dyn ApplyRepo>,
        notice: Arc<dyn NoticePort>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            profile_repo,
            friendship_repo,
            apply_repo,
            notice,
            tx_manager,
        }
    }

    fn store_err(e: anyhow::Error) -> FriendError {
        FriendError::Store(e.to_string())
    }
}

#[async_trait::async_trait]
impl FriendQueryService for RealFriendService {
    async fn profile(
        &self,
        requester: &UserId,
        target: &str,
    ) -> Result<ProfileWithRelation, FriendError> {
        if target.trim().is_empty() {
            return Err(FriendError::InvalidParameter);
        }

        // primary id first, alternate global id as the fallback path
        let profile = match self.profile_repo.get_profile(&UserId::new(target)).await? {
            Some(profile) => profile,
            None => self
                .profile_repo
                .get_profile_by_global_id(target)
                .await?
                .ok_or(FriendError::NotFound)?,
        };

        let relation = self
            .friendship_repo
            .get_relation(requester, &profile.user_id)
            .await?;

        Ok(ProfileWithRelation { profile, relation })
    }

    async fn list(
        &self,
        requester: &UserId,
        owner: &UserId,
    ) -> Result<Vec<FriendSummary>, FriendError> {
        if owner.is_empty() || owner != requester {
            return Err(FriendError::InvalidParameter);
        }

        self.friendship_repo.list_friends(owner).await
    }
}

#[async_trait::async_trait]
impl FriendApplyService for RealFriendService {
    async fn apply(
        &self,
        applicant: &UserId,
        target: &UserId,
        reason: &str,
    ) -> Result<(), FriendError> {
        if applicant.is_empty() || target.is_empty() {
            return Err(FriendError::InvalidParameter);
        }
        if applicant == target {
            return Err(FriendError::ApplySelf);
        }
        if self
            .friendship_repo
            .get_relation(applicant, target)
            .await?
            .is_friend()
        {
            return Err(FriendError::AlreadyFriend);
        }

        // cap check and insert share one tx; a losing racer rolls back on drop
        let mut tx = self.tx_manager.begin().await.map_err(Self::store_err)?;
        let pending = self
            .apply_repo
            .count_unresolved_from_in_tx(&mut *tx, applicant, target)
            .await?;
        if pending >= APPLY_PENDING_CAP {
            return Err(FriendError::ApplyRateLimited);
        }
        self.apply_repo
            .save_apply_in_tx(&mut *tx, applicant, target, reason)
            .await?;
        tx.commit().await.map_err(Self::store_err)?;

        let notice = self.notice.clone();
        let target = target.clone();
        tokio::spawn(async move {
            if let Err(e) = notice.notify_new_apply(&target).await {
                tracing::warn!("new apply notice to {target}: {e:#}");
            }
        });

        Ok(())
    }

    async fn apply_list(&self, user: &UserId) -> Result<Vec<ApplyWithProfile>, FriendError> {
        if user.is_empty() {
            return Err(FriendError::InvalidParameter);
        }

        let mut rows = self.apply_repo.list_unresolved_with_profile(user).await?;
        rows.retain(|row| !row.applicant.is_empty());
        Ok(rows)
    }

    async fn apply_count(&self, user: &UserId) -> Result<i64, FriendError> {
        if user.is_empty() {
            return Err(FriendError::InvalidParameter);
        }

        self.apply_repo.count_unresolved_received(user).await
    }

    async fn apply_result(
        &self,
        responder: &UserId,
        applicant: &UserId,
        accept: bool,
    ) -> Result<(), FriendError> {
        if responder.is_empty() || applicant.is_empty() || responder == applicant {
            return Err(FriendError::InvalidParameter);
        }

        let mut tx = self.tx_manager.begin().await.map_err(Self::store_err)?;
        let matched = self
            .apply_repo
            .resolve_apply_in_tx(&mut *tx, applicant, responder, accept)
            .await?;
        if !matched {
            // nothing unresolved: either never applied or already resolved,
            // so a duplicate accept cannot re-create the friendship
            return Err(FriendError::NotFound);
        }
        if accept {
            self.friendship_repo
                .insert_friendship_in_tx(&mut *tx, applicant, responder)
                .await?;
        }
        tx.commit().await.map_err(Self::store_err)?;

        if accept {
            let notice = self.notice.clone();
            let applicant = applicant.clone();
            let responder = responder.clone();
            tokio::spawn(async move {
                if let Err(e) = notice.notify_first_friend(&applicant, &responder).await {
                    tracing::warn!("first friend notice to {applicant}: {e:#}");
                }
            });
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl FriendDeleteService for RealFriendService {
    async fn delete(&self, owner: &UserId, friend: &UserId) -> Result<(), FriendError> {
        if owner.is_empty() || friend.is_empty() || owner == friend {
            return Err(FriendError::InvalidParameter);
        }

        let mut tx = self.tx_manager.begin().await.map_err(Self::store_err)?;
        let removed = self
            .friendship_repo
            .delete_friendship_in_tx(&mut *tx, owner, friend)
            .await?;
        if !removed {
            // already not friends
            return Err(FriendError::NotFound);
        }
        tx.commit().await.map_err(Self::store_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        profiles: Vec<UserProfile>,
        global_ids: Vec<(String, UserId)>,
        // directed friend rows, presence == Friend
        relations: Vec<(UserId, UserId)>,
        applies: Vec<FriendApply>,
    }

    #[derive(Default, Clone)]
    struct MemoryStore(Arc<Mutex<State>>);

    struct MemTx;

    #[async_trait::async_trait]
    impl<'t> StorageTx<'t> for MemTx {
        async fn commit(self: Box<Self>) -> anyhow::Result<()> {
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl TxManager for MemoryStore {
        async fn begin<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>> {
            Ok(Box::new(MemTx))
        }
    }

    #[async_trait::async_trait]
    impl ProfileRepo for MemoryStore {
        async fn get_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, FriendError> {
            let state = self.0.lock().unwrap();
            Ok(state
                .profiles
                .iter()
                .find(|p| &p.user_id == user_id)
                .cloned())
        }

        async fn get_profile_by_global_id(
            &self,
            global_id: &str,
        ) -> Result<Option<UserProfile>, FriendError> {
            let state = self.0.lock().unwrap();
            let user_id = state
                .global_ids
                .iter()
                .find(|(g, _)| g == global_id)
                .map(|(_, id)| id.clone());
            Ok(user_id
                .and_then(|id| state.profiles.iter().find(|p| p.user_id == id).cloned()))
        }
    }

    #[async_trait::async_trait]
    impl FriendshipRepo for MemoryStore {
        async fn get_relation(
            &self,
            owner: &UserId,
            other: &UserId,
        ) -> Result<Relation, FriendError> {
            let state = self.0.lock().unwrap();
            if state
                .relations
                .iter()
                .any(|(a, b)| a == owner && b == other)
            {
                Ok(Relation::Friend)
            } else {
                Ok(Relation::Stranger)
            }
        }

        async fn list_friends(&self, owner: &UserId) -> Result<Vec<FriendSummary>, FriendError> {
            let state = self.0.lock().unwrap();
            let mut out = Vec::new();
            for (a, b) in &state.relations {
                if a != owner {
                    continue;
                }
                if let Some(p) = state.profiles.iter().find(|p| &p.user_id == b) {
                    out.push(FriendSummary {
                        user_id: p.user_id.clone(),
                        username: p.username.clone(),
                        photo: p.photo.clone(),
                    });
                }
            }
            Ok(out)
        }

        async fn insert_friendship_in_tx(
            &self,
            _tx: &mut dyn StorageTx<'_>,
            a: &UserId,
            b: &UserId,
        ) -> Result<(), FriendError> {
            let mut state = self.0.lock().unwrap();
            for (x, y) in [(a, b), (b, a)] {
                if !state.relations.iter().any(|(m, n)| m == x && n == y) {
                    state.relations.push((x.clone(), y.clone()));
                }
            }
            Ok(())
        }

        async fn delete_friendship_in_tx(
            &self,
            _tx: &mut dyn StorageTx<'_>,
            a: &UserId,
            b: &UserId,
        ) -> Result<bool, FriendError> {
            let mut state = self.0.lock().unwrap();
            let before = state.relations.len();
            state
                .relations
                .retain(|(m, n)| !((m == a && n == b) || (m == b && n == a)));
            Ok(state.relations.len() < before)
        }
    }

    #[async_trait::async_trait]
    impl ApplyRepo for MemoryStore {
        async fn count_unresolved_from_in_tx(
            &self,
            _tx: &mut dyn StorageTx<'_>,
            applicant: &UserId,
            target: &UserId,
        ) -> Result<i64, FriendError> {
            let state = self.0.lock().unwrap();
            Ok(state
                .applies
                .iter()
                .filter(|a| !a.resolved && &a.applicant == applicant && &a.target == target)
                .count() as i64)
        }

        async fn save_apply_in_tx(
            &self,
            _tx: &mut dyn StorageTx<'_>,
            applicant: &UserId,
            target: &UserId,
            reason: &str,
        ) -> Result<(), FriendError> {
            let mut state = self.0.lock().unwrap();
            state.applies.push(FriendApply {
                applicant: applicant.clone(),
                target: target.clone(),
                reason: reason.to_owned(),
                created_at: Utc::now(),
                resolved: false,
                accepted: false,
            });
            Ok(())
        }

        async fn count_unresolved_received(&self, target: &UserId) -> Result<i64, FriendError> {
            let state = self.0.lock().unwrap();
            Ok(state
                .applies
                .iter()
                .filter(|a| !a.resolved && &a.target == target)
                .count() as i64)
        }

        async fn list_unresolved_with_profile(
            &self,
            target: &UserId,
        ) -> Result<Vec<ApplyWithProfile>, FriendError> {
            let state = self.0.lock().unwrap();
            let mut out = Vec::new();
            for apply in state
                .applies
                .iter()
                .filter(|a| !a.resolved && &a.target == target)
            {
                // inner join: dangling applicants disappear
                if let Some(p) = state
                    .profiles
                    .iter()
                    .find(|p| p.user_id == apply.applicant)
                {
                    out.push(ApplyWithProfile {
                        applicant: p.user_id.clone(),
                        username: p.username.clone(),
                        photo: p.photo.clone(),
                        reason: apply.reason.clone(),
                    });
                }
            }
            Ok(out)
        }

        async fn resolve_apply_in_tx(
            &self,
            _tx: &mut dyn StorageTx<'_>,
            applicant: &UserId,
            target: &UserId,
            accepted: bool,
        ) -> Result<bool, FriendError> {
            let mut state = self.0.lock().unwrap();
            let mut matched = false;
            for apply in state
                .applies
                .iter_mut()
                .filter(|a| !a.resolved && &a.applicant == applicant && &a.target == target)
            {
                apply.resolved = true;
                apply.accepted = accepted;
                matched = true;
            }
            Ok(matched)
        }
    }

    #[derive(Default)]
    struct RecordingNotice {
        new_applies: Mutex<Vec<UserId>>,
        first_friends: Mutex<Vec<(UserId, UserId)>>,
    }

    #[async_trait::async_trait]
    impl NoticePort for RecordingNotice {
        async fn notify_new_apply(&self, target: &UserId) -> anyhow::Result<()> {
            self.new_applies.lock().unwrap().push(target.clone());
            Ok(())
        }

        async fn notify_first_friend(
            &self,
            applicant: &UserId,
            responder: &UserId,
        ) -> anyhow::Result<()> {
            self.first_friends
                .lock()
                .unwrap()
                .push((applicant.clone(), responder.clone()));
            Ok(())
        }
    }

    fn uid(s: &str) -> UserId {
        UserId::new(s)
    }

    fn add_user(store: &MemoryStore, id: &str, name: &str) {
        let mut state = store.0.lock().unwrap();
        state.profiles.push(UserProfile {
            user_id: uid(id),
            username: name.to_owned(),
            photo: format!("photo-{id}"),
            status: UserStatus::Normal,
        });
        state.global_ids.push((format!("g-{id}"), uid(id)));
    }

    fn service(store: &MemoryStore, notice: &Arc<RecordingNotice>) -> RealFriendService {
        RealFriendService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            notice.clone(),
            Arc::new(store.clone()),
        )
    }

    /// Lets fire-and-forget notice tasks run on the test runtime.
    async fn settle() {
        for _ in 0..32 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn apply_to_self_is_rejected() {
        let store = MemoryStore::default();
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        let res = svc.apply(&uid("u1"), &uid("u1"), "hello me").await;
        assert!(matches!(res, Err(FriendError::ApplySelf)));
        assert!(store.0.lock().unwrap().applies.is_empty());
    }

    #[tokio::test]
    async fn apply_with_empty_applicant_is_invalid() {
        let store = MemoryStore::default();
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        let res = svc.apply(&uid(""), &uid("u2"), "hi").await;
        assert!(matches!(res, Err(FriendError::InvalidParameter)));
    }

    #[tokio::test]
    async fn sixth_unresolved_apply_is_rate_limited() {
        let store = MemoryStore::default();
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        for i in 0..5 {
            svc.apply(&uid("u1"), &uid("u2"), &format!("try {i}"))
                .await
                .unwrap();
        }
        let res = svc.apply(&uid("u1"), &uid("u2"), "one too many").await;
        assert!(matches!(res, Err(FriendError::ApplyRateLimited)));
        assert_eq!(store.0.lock().unwrap().applies.len(), 5);
    }

    #[tokio::test]
    async fn apply_is_counted_and_listed_for_the_target() {
        let store = MemoryStore::default();
        add_user(&store, "u1", "alice");
        add_user(&store, "u2", "bob");
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        svc.apply(&uid("u1"), &uid("u2"), "hi").await.unwrap();

        assert_eq!(svc.apply_count(&uid("u2")).await.unwrap(), 1);
        let list = svc.apply_list(&uid("u2")).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].applicant, uid("u1"));
        assert_eq!(list[0].username, "alice");
        assert_eq!(list[0].reason, "hi");

        settle().await;
        assert_eq!(notice.new_applies.lock().unwrap().as_slice(), &[uid("u2")]);
    }

    #[tokio::test]
    async fn apply_list_skips_dangling_applicants() {
        let store = MemoryStore::default();
        add_user(&store, "u2", "bob");
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        // ghost has no profile row
        svc.apply(&uid("ghost"), &uid("u2"), "boo").await.unwrap();

        assert_eq!(svc.apply_count(&uid("u2")).await.unwrap(), 1);
        assert!(svc.apply_list(&uid("u2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn accept_makes_the_relation_symmetric() {
        let store = MemoryStore::default();
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        svc.apply(&uid("u1"), &uid("u2"), "hi").await.unwrap();
        svc.apply_result(&uid("u2"), &uid("u1"), true).await.unwrap();

        assert!(
            store
                .get_relation(&uid("u1"), &uid("u2"))
                .await
                .unwrap()
                .is_friend()
        );
        assert!(
            store
                .get_relation(&uid("u2"), &uid("u1"))
                .await
                .unwrap()
                .is_friend()
        );
        assert_eq!(svc.apply_count(&uid("u2")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn accept_twice_fails_and_notifies_once() {
        let store = MemoryStore::default();
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        svc.apply(&uid("u1"), &uid("u2"), "hi").await.unwrap();
        svc.apply_result(&uid("u2"), &uid("u1"), true).await.unwrap();
        let second = svc.apply_result(&uid("u2"), &uid("u1"), true).await;
        assert!(matches!(second, Err(FriendError::NotFound)));

        // exactly the two mirrored rows, no duplicates
        assert_eq!(store.0.lock().unwrap().relations.len(), 2);
        settle().await;
        assert_eq!(
            notice.first_friends.lock().unwrap().as_slice(),
            &[(uid("u1"), uid("u2"))]
        );
    }

    #[tokio::test]
    async fn reject_changes_nothing_and_sends_no_notice() {
        let store = MemoryStore::default();
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        svc.apply(&uid("u1"), &uid("u2"), "hi").await.unwrap();
        svc.apply_result(&uid("u2"), &uid("u1"), false)
            .await
            .unwrap();

        assert!(
            !store
                .get_relation(&uid("u1"), &uid("u2"))
                .await
                .unwrap()
                .is_friend()
        );
        assert_eq!(svc.apply_count(&uid("u2")).await.unwrap(), 0);
        settle().await;
        assert!(notice.first_friends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn accept_without_an_application_is_not_found() {
        let store = MemoryStore::default();
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        let res = svc.apply_result(&uid("u2"), &uid("u1"), true).await;
        assert!(matches!(res, Err(FriendError::NotFound)));
    }

    #[tokio::test]
    async fn apply_result_rejects_bad_parameters() {
        let store = MemoryStore::default();
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        for (responder, applicant) in [("", "u1"), ("u2", ""), ("u2", "u2")] {
            let res = svc.apply_result(&uid(responder), &uid(applicant), true).await;
            assert!(matches!(res, Err(FriendError::InvalidParameter)));
        }
    }

    #[tokio::test]
    async fn friends_cannot_reapply() {
        let store = MemoryStore::default();
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        svc.apply(&uid("u1"), &uid("u2"), "hi").await.unwrap();
        svc.apply_result(&uid("u2"), &uid("u1"), true).await.unwrap();

        let res = svc.apply(&uid("u1"), &uid("u2"), "again").await;
        assert!(matches!(res, Err(FriendError::AlreadyFriend)));
    }

    #[tokio::test]
    async fn delete_reverts_both_directions_to_stranger() {
        let store = MemoryStore::default();
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        svc.apply(&uid("u1"), &uid("u2"), "hi").await.unwrap();
        svc.apply_result(&uid("u2"), &uid("u1"), true).await.unwrap();
        svc.delete(&uid("u1"), &uid("u2")).await.unwrap();

        assert_eq!(
            store.get_relation(&uid("u1"), &uid("u2")).await.unwrap(),
            Relation::Stranger
        );
        assert_eq!(
            store.get_relation(&uid("u2"), &uid("u1")).await.unwrap(),
            Relation::Stranger
        );

        // already not friends
        let again = svc.delete(&uid("u1"), &uid("u2")).await;
        assert!(matches!(again, Err(FriendError::NotFound)));
    }

    #[tokio::test]
    async fn delete_rejects_bad_parameters() {
        let store = MemoryStore::default();
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        for (owner, friend) in [("", "u2"), ("u1", ""), ("u1", "u1")] {
            let res = svc.delete(&uid(owner), &uid(friend)).await;
            assert!(matches!(res, Err(FriendError::InvalidParameter)));
        }
    }

    #[tokio::test]
    async fn profile_resolves_primary_then_global_id() {
        let store = MemoryStore::default();
        add_user(&store, "u2", "bob");
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        let by_primary = svc.profile(&uid("u1"), "u2").await.unwrap();
        assert_eq!(by_primary.profile.user_id, uid("u2"));
        assert_eq!(by_primary.relation, Relation::Stranger);

        let by_global = svc.profile(&uid("u1"), "g-u2").await.unwrap();
        assert_eq!(by_global.profile.user_id, uid("u2"));
    }

    #[tokio::test]
    async fn profile_unresolvable_on_both_paths_is_not_found() {
        let store = MemoryStore::default();
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        let res = svc.profile(&uid("u1"), "nobody").await;
        assert!(matches!(res, Err(FriendError::NotFound)));

        let empty = svc.profile(&uid("u1"), "  ").await;
        assert!(matches!(empty, Err(FriendError::InvalidParameter)));
    }

    #[tokio::test]
    async fn profile_reports_friend_relation_after_accept() {
        let store = MemoryStore::default();
        add_user(&store, "u1", "alice");
        add_user(&store, "u2", "bob");
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        svc.apply(&uid("u1"), &uid("u2"), "hi").await.unwrap();
        svc.apply_result(&uid("u2"), &uid("u1"), true).await.unwrap();

        let joined = svc.profile(&uid("u1"), "u2").await.unwrap();
        assert_eq!(joined.relation, Relation::Friend);
    }

    #[tokio::test]
    async fn friend_list_is_owner_only() {
        let store = MemoryStore::default();
        add_user(&store, "u1", "alice");
        add_user(&store, "u2", "bob");
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        svc.apply(&uid("u1"), &uid("u2"), "hi").await.unwrap();
        svc.apply_result(&uid("u2"), &uid("u1"), true).await.unwrap();

        let mine = svc.list(&uid("u1"), &uid("u1")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].user_id, uid("u2"));
        assert_eq!(mine[0].username, "bob");

        let theirs = svc.list(&uid("u1"), &uid("u2")).await;
        assert!(matches!(theirs, Err(FriendError::InvalidParameter)));
    }

    #[tokio::test]
    async fn empty_friend_list_is_a_valid_result() {
        let store = MemoryStore::default();
        add_user(&store, "u1", "alice");
        let notice = Arc::new(RecordingNotice::default());
        let svc = service(&store, &notice);

        let mine = svc.list(&uid("u1"), &uid("u1")).await.unwrap();
        assert!(mine.is_empty());
    }
}
