//! Application-layer tests for the tenancy crate
//!
//! Exercises the use cases against the in-memory store and collaborator
//! doubles.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};

use crate::application::actor::Actor;
use crate::application::{
    CreateBranchInput, CreateBranchUseCase, CreateCashierInput, CreateCashierUseCase,
    CreateOrganizationInput, CreateOrganizationOutput, CreateOrganizationUseCase,
    DeleteBranchInput, DeleteBranchUseCase, IdentityProvisioner, InviteTokenManager,
    ResetCredentialInput, ResetCredentialUseCase, SessionManager, SetCredentialInput,
    SetCredentialUseCase, SignInInput, SignInUseCase, TenancyConfig, UpsertManagerInput,
    UpsertManagerUseCase,
};
use crate::domain::entity::account::{
    AccountProfile, CredentialAlgorithm, NewIdentity, StoredCredential,
};
use crate::domain::entity::branch::Branch;
use crate::domain::entity::invite::{InviteKind, InviteToken};
use crate::domain::entity::organization::Organization;
use crate::domain::repository::{
    AccountRepository, BranchRepository, DirectoryProvider, InviteRepository,
    OrganizationRepository,
};
use crate::domain::value_object::{AccountStatus, Email, Role};
use crate::error::TenancyError;
use crate::infra::memory::{FailingNotifier, InMemoryDirectory, InMemoryTenancy, RecordingNotifier};
use kernel::id::{AccountId, BranchId, Id, OrgId};
use platform::pin::{is_modern_hash, legacy_digest};

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    repo: Arc<InMemoryTenancy>,
    directory: Arc<InMemoryDirectory>,
    notifier: Arc<RecordingNotifier>,
    config: Arc<TenancyConfig>,
}

impl Fixture {
    fn new() -> Self {
        let config = TenancyConfig {
            pepper: Some(b"test-pepper".to_vec()),
            ..TenancyConfig::development()
        };
        Self {
            repo: Arc::new(InMemoryTenancy::new()),
            directory: Arc::new(InMemoryDirectory::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            config: Arc::new(config),
        }
    }

    fn provisioner(
        &self,
    ) -> IdentityProvisioner<
        InMemoryTenancy,
        InMemoryTenancy,
        InMemoryDirectory,
        InMemoryTenancy,
        RecordingNotifier,
    > {
        IdentityProvisioner::new(
            self.repo.clone(),
            self.repo.clone(),
            self.directory.clone(),
            self.repo.clone(),
            self.notifier.clone(),
            self.config.clone(),
        )
    }

    async fn create_org(&self, name: &str, owner_email: &str) -> CreateOrganizationOutput {
        let use_case = CreateOrganizationUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.directory.clone(),
            self.config.clone(),
        );
        use_case
            .execute(CreateOrganizationInput {
                name: name.to_string(),
                owner_display_name: "Owner".to_string(),
                owner_email: owner_email.to_string(),
                owner_password: "a sufficiently long password".to_string(),
            })
            .await
            .expect("organization creation failed")
    }

    async fn create_branch(&self, org_id: OrgId, name: &str, actor: AccountId) -> Branch {
        let use_case = CreateBranchUseCase::new(self.repo.clone(), self.repo.clone());
        use_case
            .execute(CreateBranchInput {
                org_id,
                name: name.to_string(),
                actor_id: actor,
            })
            .await
            .expect("branch creation failed")
    }

    // Several repository traits share method names on the one store;
    // these helpers pin the trait for test assertions.

    async fn org(&self, org_id: &OrgId) -> Option<Organization> {
        OrganizationRepository::find_by_id(self.repo.as_ref(), org_id)
            .await
            .unwrap()
    }

    async fn branch(&self, org_id: &OrgId, branch_id: &BranchId) -> Option<Branch> {
        BranchRepository::find_by_id(self.repo.as_ref(), org_id, branch_id)
            .await
            .unwrap()
    }

    async fn account(&self, account_id: &AccountId) -> Option<AccountProfile> {
        AccountRepository::find_by_id(self.repo.as_ref(), account_id)
            .await
            .unwrap()
    }

    async fn insert_account(&self, profile: &AccountProfile) {
        AccountRepository::create(self.repo.as_ref(), profile)
            .await
            .unwrap()
    }

    async fn insert_invite(&self, invite: &InviteToken) {
        InviteRepository::create(self.repo.as_ref(), invite)
            .await
            .unwrap()
    }

    fn owner_actor(&self, org_id: OrgId, owner: AccountId) -> Actor {
        Actor {
            account_id: owner,
            role: Role::Owner,
            org_id: Some(org_id),
            branch_id: None,
        }
    }

    async fn create_cashier(
        &self,
        org_id: OrgId,
        branch_id: BranchId,
        actor: &Actor,
        name: &str,
        pin: &str,
    ) -> Result<AccountProfile, TenancyError> {
        let use_case = CreateCashierUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.provisioner(),
        );
        use_case
            .execute(
                CreateCashierInput {
                    org_id,
                    branch_id,
                    display_name: name.to_string(),
                    pin: pin.to_string(),
                },
                actor,
            )
            .await
    }
}

// ============================================================================
// Branch numbering and username derivation
// ============================================================================

mod hierarchy_tests {
    use super::*;

    #[tokio::test]
    async fn test_colombo_scenario() {
        let fx = Fixture::new();
        let org = fx.create_org("Acme", "owner@example.com").await;

        let first = fx
            .create_branch(org.org_id, "Colombo", org.owner_account_id)
            .await;
        assert_eq!(first.branch_no, 1);
        assert_eq!(first.username, "acme-colombo");

        // Second branch with the same name: next number, suffixed
        // username - never the one already taken
        let second = fx
            .create_branch(org.org_id, "Colombo", org.owner_account_id)
            .await;
        assert_eq!(second.branch_no, 2);
        assert_eq!(second.slug, "colombo-2");
        assert_eq!(second.username, "acme-colombo-2");
    }

    #[tokio::test]
    async fn test_branch_numbers_gapless_under_concurrency() {
        let fx = Fixture::new();
        let org = fx.create_org("Acme", "owner@example.com").await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = fx.repo.clone();
            let org_id = org.org_id;
            let owner = org.owner_account_id;
            handles.push(tokio::spawn(async move {
                let use_case = CreateBranchUseCase::new(repo.clone(), repo);
                use_case
                    .execute(CreateBranchInput {
                        org_id,
                        name: format!("Branch {i}"),
                        actor_id: owner,
                    })
                    .await
                    .expect("concurrent branch creation failed")
            }));
        }

        let mut numbers: Vec<u32> = Vec::new();
        for handle in handles {
            numbers.push(handle.await.expect("task panicked").branch_no);
        }
        numbers.sort_unstable();

        // Strictly increasing by exactly 1, no gaps or repeats
        assert_eq!(numbers, (1..=8).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_non_owner_cannot_create_branch() {
        let fx = Fixture::new();
        let org = fx.create_org("Acme", "owner@example.com").await;

        let intruder: AccountId = Id::new();
        let use_case = CreateBranchUseCase::new(fx.repo.clone(), fx.repo.clone());
        let result = use_case
            .execute(CreateBranchInput {
                org_id: org.org_id,
                name: "Rogue".to_string(),
                actor_id: intruder,
            })
            .await;

        assert!(matches!(result, Err(TenancyError::NotOwner)));
    }

    #[tokio::test]
    async fn test_org_slug_disambiguation() {
        let fx = Fixture::new();
        let first = fx.create_org("Acme", "one@example.com").await;
        let second = fx.create_org("Acme", "two@example.com").await;

        assert_eq!(first.slug, "acme");
        assert_eq!(second.slug, "acme-2");
    }

    #[tokio::test]
    async fn test_cashier_usernames_follow_branch_sequence() {
        let fx = Fixture::new();
        let org = fx.create_org("Acme", "owner@example.com").await;
        let branch = fx
            .create_branch(org.org_id, "Colombo", org.owner_account_id)
            .await;
        let actor = fx.owner_actor(org.org_id, org.owner_account_id);

        let first = fx
            .create_cashier(org.org_id, branch.branch_id, &actor, "Kasun", "4826")
            .await
            .unwrap();
        let second = fx
            .create_cashier(org.org_id, branch.branch_id, &actor, "Nadia", "9317")
            .await
            .unwrap();

        assert_eq!(first.username.as_deref(), Some("acme-colombo-1"));
        assert_eq!(second.username.as_deref(), Some("acme-colombo-2"));
        assert_eq!(
            first.login_email.as_str(),
            "acme-colombo-1@accounts.internal"
        );

        let org_after = fx.org(&org.org_id).await.unwrap();
        assert_eq!(org_after.cashier_count, 2);
    }

    #[tokio::test]
    async fn test_manager_scoped_to_other_branch_is_forbidden() {
        let fx = Fixture::new();
        let org = fx.create_org("Acme", "owner@example.com").await;
        let b1 = fx
            .create_branch(org.org_id, "Colombo", org.owner_account_id)
            .await;
        let b2 = fx
            .create_branch(org.org_id, "Kandy", org.owner_account_id)
            .await;

        let manager_actor = Actor {
            account_id: Id::new(),
            role: Role::Manager,
            org_id: Some(org.org_id),
            branch_id: Some(b1.branch_id),
        };

        let result = fx
            .create_cashier(org.org_id, b2.branch_id, &manager_actor, "Kasun", "4826")
            .await;
        assert!(matches!(result, Err(TenancyError::ScopeMismatch)));

        // No cashier record was written
        let profiles = fx
            .repo
            .list_by_branch(&org.org_id, &b2.branch_id)
            .await
            .unwrap();
        assert!(profiles.is_empty());
    }

    #[tokio::test]
    async fn test_delete_branch_cascades() {
        let fx = Fixture::new();
        let org = fx.create_org("Acme", "owner@example.com").await;
        let branch = fx
            .create_branch(org.org_id, "Colombo", org.owner_account_id)
            .await;
        let actor = fx.owner_actor(org.org_id, org.owner_account_id);

        let cashier = fx
            .create_cashier(org.org_id, branch.branch_id, &actor, "Kasun", "4826")
            .await
            .unwrap();

        let manager_use_case =
            UpsertManagerUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.provisioner());
        let manager = manager_use_case
            .execute(UpsertManagerInput {
                org_id: org.org_id,
                branch_id: branch.branch_id,
                actor_id: org.owner_account_id,
                display_name: "Nadia".to_string(),
                email: None,
                pin: Some("9317".to_string()),
            })
            .await
            .unwrap();

        let delete_use_case = DeleteBranchUseCase::new(
            fx.repo.clone(),
            fx.repo.clone(),
            fx.repo.clone(),
            fx.directory.clone(),
        );
        delete_use_case
            .execute(DeleteBranchInput {
                org_id: org.org_id,
                branch_id: branch.branch_id,
                actor_id: org.owner_account_id,
            })
            .await
            .unwrap();

        // Branch, cashier and manager identities are all gone
        assert!(fx.branch(&org.org_id, &branch.branch_id).await.is_none());
        assert!(fx.account(&cashier.account_id).await.is_none());
        assert!(fx.account(&manager.account_id).await.is_none());
        assert!(fx.directory.find(&cashier.account_id).await.unwrap().is_none());
        assert!(fx.directory.find(&manager.account_id).await.unwrap().is_none());

        let org_after = fx.org(&org.org_id).await.unwrap();
        assert_eq!(org_after.branch_count, 0);
        assert_eq!(org_after.cashier_count, 0);
    }
}

// ============================================================================
// Invite tokens
// ============================================================================

mod invite_tests {
    use super::*;

    #[tokio::test]
    async fn test_exactly_one_concurrent_consume_wins() {
        let fx = Fixture::new();
        let manager = InviteTokenManager::new(fx.repo.clone(), fx.config.clone());

        let email = Email::new("manager@example.com").unwrap();
        let raw = manager
            .issue(&email, "Nadia", InviteKind::Onboarding)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = fx.repo.clone();
            let config = fx.config.clone();
            let raw = raw.clone();
            handles.push(tokio::spawn(async move {
                let manager = InviteTokenManager::new(repo, config);
                manager.consume(&raw).await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            match handle.await.expect("task panicked") {
                Ok(consumed) => {
                    wins += 1;
                    assert_eq!(consumed.email.as_str(), "manager@example.com");
                    assert_eq!(consumed.name_hint, "Nadia");
                }
                Err(TenancyError::InviteAlreadyUsed) | Err(TenancyError::InviteNotFound) => {}
                Err(other) => panic!("unexpected consume error: {other}"),
            }
        }

        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn test_unknown_token_not_found() {
        let fx = Fixture::new();
        let manager = InviteTokenManager::new(fx.repo.clone(), fx.config.clone());

        let result = manager.consume("no-such-token").await;
        assert!(matches!(result, Err(TenancyError::InviteNotFound)));
    }

    #[tokio::test]
    async fn test_expired_token_deleted_on_lookup() {
        let fx = Fixture::new();
        let email = Email::new("manager@example.com").unwrap();

        let (mut invite, raw) =
            InviteToken::issue(email, "Nadia", ChronoDuration::hours(1));
        invite.expires_at = Utc::now() - ChronoDuration::seconds(1);
        fx.insert_invite(&invite).await;

        let manager = InviteTokenManager::new(fx.repo.clone(), fx.config.clone());
        let result = manager.consume(&raw).await;
        assert!(matches!(result, Err(TenancyError::InviteExpired)));

        // Record was deleted; a replay now reports NotFound
        let result = manager.consume(&raw).await;
        assert!(matches!(result, Err(TenancyError::InviteNotFound)));
    }

    #[tokio::test]
    async fn test_issue_cleans_up_stale_tokens() {
        let fx = Fixture::new();
        let email = Email::new("manager@example.com").unwrap();

        let (mut stale, _) = InviteToken::issue(email.clone(), "Old", ChronoDuration::hours(1));
        stale.used = true;
        fx.insert_invite(&stale).await;

        let manager = InviteTokenManager::new(fx.repo.clone(), fx.config.clone());
        manager
            .issue(&email, "New", InviteKind::Onboarding)
            .await
            .unwrap();

        let gone = fx.repo.find_by_digest(&stale.token_digest).await.unwrap();
        assert!(gone.is_none());
    }
}

// ============================================================================
// Deferred provisioning and credential setup
// ============================================================================

mod provisioning_tests {
    use super::*;

    #[tokio::test]
    async fn test_manager_invite_flow_end_to_end() {
        let fx = Fixture::new();
        let org = fx.create_org("Acme", "owner@example.com").await;
        let branch = fx
            .create_branch(org.org_id, "Colombo", org.owner_account_id)
            .await;

        // Invite a manager without a PIN: deferred flow
        let use_case =
            UpsertManagerUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.provisioner());
        let manager = use_case
            .execute(UpsertManagerInput {
                org_id: org.org_id,
                branch_id: branch.branch_id,
                actor_id: org.owner_account_id,
                display_name: "Nadia".to_string(),
                email: Some("nadia@example.com".to_string()),
                pin: None,
            })
            .await
            .unwrap();

        assert_eq!(manager.status, AccountStatus::Pending);
        assert!(manager.credential.is_none());

        // Directory half is disabled until activation
        let dir = fx.directory.find(&manager.account_id).await.unwrap().unwrap();
        assert!(dir.disabled);

        // Branch points at the manager slot
        let branch_after = fx.branch(&org.org_id, &branch.branch_id).await.unwrap();
        assert_eq!(branch_after.manager_account_id, Some(manager.account_id));

        // The setup link was delivered with the raw token
        let raw_token = fx.notifier.last_token().expect("no invite delivered");

        // Set the credential through the invite
        let set_use_case = SetCredentialUseCase::new(fx.provisioner());
        let activated = set_use_case
            .execute(SetCredentialInput {
                role: Role::Manager,
                token: raw_token.clone(),
                secret: "9472".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(activated.status, AccountStatus::Active);

        let dir = fx.directory.find(&manager.account_id).await.unwrap().unwrap();
        assert!(!dir.disabled);

        // Sign-in with the chosen PIN now succeeds
        let sign_in =
            SignInUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.config.clone());
        let output = sign_in
            .execute(SignInInput {
                role: Role::Manager,
                identifier: "nadia@example.com".to_string(),
                secret: "9472".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(output.account_id, manager.account_id);

        // Replaying the same token reports AlreadyUsed
        let replay = set_use_case
            .execute(SetCredentialInput {
                role: Role::Manager,
                token: raw_token,
                secret: "8361".to_string(),
            })
            .await;
        assert!(matches!(replay, Err(TenancyError::InviteAlreadyUsed)));
    }

    #[tokio::test]
    async fn test_delivery_failure_is_not_fatal() {
        let fx = Fixture::new();

        let provisioner = IdentityProvisioner::new(
            fx.repo.clone(),
            fx.repo.clone(),
            fx.directory.clone(),
            fx.repo.clone(),
            Arc::new(FailingNotifier),
            fx.config.clone(),
        );

        let email = Email::new("staff@example.com").unwrap();
        let profile = provisioner
            .provision_deferred(NewIdentity {
                role: Role::Staff,
                org_id: None,
                branch_id: None,
                display_name: "Sam".to_string(),
                contact_email: Some(email.clone()),
                login_email: email,
                username: None,
            })
            .await
            .expect("provisioning must survive delivery failure");

        assert_eq!(profile.status, AccountStatus::Pending);
        assert!(fx.account(&profile.account_id).await.is_some());
    }

    #[tokio::test]
    async fn test_manager_reassignment_reuses_slot() {
        let fx = Fixture::new();
        let org = fx.create_org("Acme", "owner@example.com").await;
        let branch = fx
            .create_branch(org.org_id, "Colombo", org.owner_account_id)
            .await;

        let use_case =
            UpsertManagerUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.provisioner());

        let first = use_case
            .execute(UpsertManagerInput {
                org_id: org.org_id,
                branch_id: branch.branch_id,
                actor_id: org.owner_account_id,
                display_name: "Nadia".to_string(),
                email: None,
                pin: Some("9317".to_string()),
            })
            .await
            .unwrap();

        let second = use_case
            .execute(UpsertManagerInput {
                org_id: org.org_id,
                branch_id: branch.branch_id,
                actor_id: org.owner_account_id,
                display_name: "Ruwan".to_string(),
                email: None,
                pin: Some("6149".to_string()),
            })
            .await
            .unwrap();

        // Old identity is gone, both halves
        assert!(fx.account(&first.account_id).await.is_none());
        assert!(fx.directory.find(&first.account_id).await.unwrap().is_none());

        // Same fixed username slot, new identity behind it
        assert_eq!(first.username, second.username);
        assert_eq!(first.username.as_deref(), Some("acme-colombo-mgr"));

        let branch_after = fx.branch(&org.org_id, &branch.branch_id).await.unwrap();
        assert_eq!(branch_after.manager_account_id, Some(second.account_id));
    }

    #[tokio::test]
    async fn test_reset_flow_issues_short_lived_invite() {
        let fx = Fixture::new();
        let org = fx.create_org("Acme", "owner@example.com").await;
        let branch = fx
            .create_branch(org.org_id, "Colombo", org.owner_account_id)
            .await;

        let use_case =
            UpsertManagerUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.provisioner());
        use_case
            .execute(UpsertManagerInput {
                org_id: org.org_id,
                branch_id: branch.branch_id,
                actor_id: org.owner_account_id,
                display_name: "Nadia".to_string(),
                email: Some("nadia@example.com".to_string()),
                pin: Some("9317".to_string()),
            })
            .await
            .unwrap();

        let reset = ResetCredentialUseCase::new(
            fx.repo.clone(),
            fx.repo.clone(),
            fx.notifier.clone(),
            fx.config.clone(),
        );
        reset
            .execute(ResetCredentialInput {
                role: Role::Manager,
                email: "nadia@example.com".to_string(),
            })
            .await
            .unwrap();

        let sent = fx.notifier.sent();
        let reset_delivery = sent.last().unwrap();
        assert!(reset_delivery.is_reset);

        // Consuming the reset token re-activates with the new PIN
        let set_use_case = SetCredentialUseCase::new(fx.provisioner());
        set_use_case
            .execute(SetCredentialInput {
                role: Role::Manager,
                token: reset_delivery.raw_token.clone(),
                secret: "2846".to_string(),
            })
            .await
            .unwrap();

        let sign_in =
            SignInUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.config.clone());
        assert!(
            sign_in
                .execute(SignInInput {
                    role: Role::Manager,
                    identifier: "nadia@example.com".to_string(),
                    secret: "2846".to_string(),
                })
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_reset_for_unknown_account_reports_success() {
        let fx = Fixture::new();

        let reset = ResetCredentialUseCase::new(
            fx.repo.clone(),
            fx.repo.clone(),
            fx.notifier.clone(),
            fx.config.clone(),
        );
        let result = reset
            .execute(ResetCredentialInput {
                role: Role::Manager,
                email: "nobody@example.com".to_string(),
            })
            .await;

        assert!(result.is_ok());
        assert!(fx.notifier.sent().is_empty());
    }
}

// ============================================================================
// Sign-in, sessions, and legacy-hash migration
// ============================================================================

mod sign_in_tests {
    use super::*;

    #[tokio::test]
    async fn test_cashier_signs_in_by_username() {
        let fx = Fixture::new();
        let org = fx.create_org("Acme", "owner@example.com").await;
        let branch = fx
            .create_branch(org.org_id, "Colombo", org.owner_account_id)
            .await;
        let actor = fx.owner_actor(org.org_id, org.owner_account_id);

        fx.create_cashier(org.org_id, branch.branch_id, &actor, "Kasun", "4826")
            .await
            .unwrap();

        let sign_in =
            SignInUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.config.clone());

        let output = sign_in
            .execute(SignInInput {
                role: Role::Cashier,
                identifier: "acme-colombo-1".to_string(),
                secret: "4826".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(output.branch_id, Some(branch.branch_id));

        // Wrong PIN fails closed
        let wrong = sign_in
            .execute(SignInInput {
                role: Role::Cashier,
                identifier: "acme-colombo-1".to_string(),
                secret: "1112".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(TenancyError::InvalidCredentials)));

        // Wrong role surface fails without an oracle
        let wrong_role = sign_in
            .execute(SignInInput {
                role: Role::Manager,
                identifier: "acme-colombo-1".to_string(),
                secret: "4826".to_string(),
            })
            .await;
        assert!(matches!(wrong_role, Err(TenancyError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_disabled_account_is_forbidden() {
        let fx = Fixture::new();
        let org = fx.create_org("Acme", "owner@example.com").await;
        let branch = fx
            .create_branch(org.org_id, "Colombo", org.owner_account_id)
            .await;
        let actor = fx.owner_actor(org.org_id, org.owner_account_id);

        let cashier = fx
            .create_cashier(org.org_id, branch.branch_id, &actor, "Kasun", "4826")
            .await
            .unwrap();

        let mut disabled = cashier.clone();
        disabled.status = AccountStatus::Disabled;
        fx.repo.update(&disabled).await.unwrap();

        let sign_in =
            SignInUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.config.clone());
        let result = sign_in
            .execute(SignInInput {
                role: Role::Cashier,
                identifier: "acme-colombo-1".to_string(),
                secret: "4826".to_string(),
            })
            .await;

        assert!(matches!(result, Err(TenancyError::AccountDisabled)));
    }

    #[tokio::test]
    async fn test_new_session_invalidates_prior_session() {
        let fx = Fixture::new();
        let account: AccountId = Id::new();

        let manager = SessionManager::new(fx.repo.clone(), fx.config.clone());

        let first = manager.create_session(&account).await.unwrap();
        assert!(manager.validate(&first).await.is_ok());

        let second = manager.create_session(&account).await.unwrap();
        assert!(manager.validate(&second).await.is_ok());

        // The earlier token no longer validates
        assert!(matches!(
            manager.validate(&first).await,
            Err(TenancyError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn test_tampered_session_token_rejected() {
        let fx = Fixture::new();
        let account: AccountId = Id::new();

        let manager = SessionManager::new(fx.repo.clone(), fx.config.clone());
        let token = manager.create_session(&account).await.unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('x');

        assert!(matches!(
            manager.validate(&tampered).await,
            Err(TenancyError::SessionInvalid)
        ));
        assert!(matches!(
            manager.validate("not-a-token").await,
            Err(TenancyError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let fx = Fixture::new();
        let account: AccountId = Id::new();

        let manager = SessionManager::new(fx.repo.clone(), fx.config.clone());
        let token = manager.create_session(&account).await.unwrap();

        manager.destroy(&token).await.unwrap();
        manager.destroy(&token).await.unwrap();

        assert!(matches!(
            manager.validate(&token).await,
            Err(TenancyError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn test_legacy_hash_upgraded_on_successful_sign_in() {
        let fx = Fixture::new();
        let org = fx.create_org("Acme", "owner@example.com").await;
        let branch = fx
            .create_branch(org.org_id, "Colombo", org.owner_account_id)
            .await;

        // A cashier carried over from the old scheme: unsalted hex digest
        let profile = AccountProfile::from_identity(
            NewIdentity {
                role: Role::Cashier,
                org_id: Some(org.org_id),
                branch_id: Some(branch.branch_id),
                display_name: "Kasun".to_string(),
                contact_email: None,
                login_email: Email::virtual_for("acme-colombo-1"),
                username: Some("acme-colombo-1".to_string()),
            },
            AccountStatus::Active,
            Some(StoredCredential::legacy(legacy_digest("4826"))),
        );
        fx.insert_account(&profile).await;

        let sign_in =
            SignInUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.config.clone());

        // Legacy credential still signs in
        sign_in
            .execute(SignInInput {
                role: Role::Cashier,
                identifier: "acme-colombo-1".to_string(),
                secret: "4826".to_string(),
            })
            .await
            .expect("legacy sign-in failed");

        // The stored hash is now modern, tagged, and timestamped
        let upgraded = fx.account(&profile.account_id).await.unwrap();
        let credential = upgraded.credential.expect("credential missing");
        assert_eq!(credential.algorithm, CredentialAlgorithm::Argon2id);
        assert!(is_modern_hash(&credential.hash));
        assert!(credential.upgraded_at.is_some());

        // And the same PIN keeps working under the new scheme
        sign_in
            .execute(SignInInput {
                role: Role::Cashier,
                identifier: "acme-colombo-1".to_string(),
                secret: "4826".to_string(),
            })
            .await
            .expect("post-upgrade sign-in failed");

        // While the wrong PIN still fails
        let wrong = sign_in
            .execute(SignInInput {
                role: Role::Cashier,
                identifier: "acme-colombo-1".to_string(),
                secret: "4827".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(TenancyError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_owner_signs_in_with_password() {
        let fx = Fixture::new();
        let org = fx.create_org("Acme", "owner@example.com").await;

        let sign_in =
            SignInUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.config.clone());
        let output = sign_in
            .execute(SignInInput {
                role: Role::Owner,
                identifier: "owner@example.com".to_string(),
                secret: "a sufficiently long password".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(output.account_id, org.owner_account_id);
        assert_eq!(output.org_id, Some(org.org_id));
    }
}
