use crate::core::member::{BankAccount, Member, ReferralCode, UserId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use thiserror::Error;

/// Errors raised by a member directory.
///
/// A missing member is never an error: lookups return `Ok(None)`.
/// These variants describe infrastructure faults and rejected writes.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory lookup failed: {0}")]
    LookupFailed(String),
    #[error("referral code {0} is already registered")]
    DuplicateReferralCode(ReferralCode),
    #[error("user id {0} is already registered")]
    DuplicateUserId(UserId),
    #[error("failed to parse directory document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Field a member can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupField {
    ReferralCode,
    Email,
    UserId,
}

impl fmt::Display for LookupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ReferralCode => "referralCode",
            Self::Email => "email",
            Self::UserId => "userId",
        };
        f.write_str(s)
    }
}

/// Read access to the member directory backing the calculations.
///
/// Implementations wrap whatever store holds the member documents.
/// `load_subtree` exists so a whole downline can be fetched in one
/// round-trip instead of one lookup per node.
pub trait DownlineRepository {
    fn find_user_by_field(
        &self,
        field: LookupField,
        value: &str,
    ) -> Result<Option<Member>, DirectoryError>;

    fn find_user_by_referral_code(
        &self,
        code: &ReferralCode,
    ) -> Result<Option<Member>, DirectoryError> {
        self.find_user_by_field(LookupField::ReferralCode, code.as_str())
    }

    /// Every member reachable from `root` through downline slots,
    /// `root` included, within `depth` levels. Keyed by referral code.
    fn load_subtree(
        &self,
        root: &ReferralCode,
        depth: u32,
    ) -> Result<HashMap<ReferralCode, Member>, DirectoryError>;

    /// Members whose `referred_by` is `code`.
    fn direct_referrals(&self, code: &ReferralCode) -> Result<Vec<Member>, DirectoryError>;

    fn bank_account(&self, user_id: &UserId) -> Result<Option<BankAccount>, DirectoryError>;

    /// All members in the directory.
    fn members(&self) -> Result<Vec<Member>, DirectoryError>;
}

/// JSON document accepted by [`InMemoryDirectory::from_json_str`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySnapshot {
    pub members: Vec<Member>,
    #[serde(default)]
    pub bank_accounts: Vec<BankAccount>,
}

/// Member directory held in memory.
///
/// # Examples
///
/// ```
/// use binary_payout_engine::core::member::{Member, ReferralCode, UserId};
/// use binary_payout_engine::network::directory::{DownlineRepository, InMemoryDirectory};
///
/// let mut directory = InMemoryDirectory::new();
/// directory
///     .insert(Member::new(UserId::new("u1"), ReferralCode::new("AFF1")))
///     .unwrap();
///
/// let found = directory
///     .find_user_by_referral_code(&ReferralCode::new("AFF1"))
///     .unwrap();
/// assert!(found.is_some());
/// assert_eq!(directory.member_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    members: HashMap<ReferralCode, Member>,
    /// user id -> referral code
    by_user_id: HashMap<UserId, ReferralCode>,
    bank_accounts: HashMap<UserId, BankAccount>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. Referral codes and user ids must be unique.
    pub fn insert(&mut self, member: Member) -> Result<(), DirectoryError> {
        if self.members.contains_key(&member.referral_code) {
            return Err(DirectoryError::DuplicateReferralCode(
                member.referral_code.clone(),
            ));
        }
        if self.by_user_id.contains_key(&member.user_id) {
            return Err(DirectoryError::DuplicateUserId(member.user_id.clone()));
        }
        self.by_user_id
            .insert(member.user_id.clone(), member.referral_code.clone());
        self.members.insert(member.referral_code.clone(), member);
        Ok(())
    }

    /// Put a bank account on file, replacing any previous one.
    pub fn insert_bank_account(&mut self, account: BankAccount) {
        self.bank_accounts.insert(account.user_id.clone(), account);
    }

    /// Mutable access to a member, for approval and KYC workflows.
    pub fn member_mut(&mut self, code: &ReferralCode) -> Option<&mut Member> {
        self.members.get_mut(code)
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Result<Self, DirectoryError> {
        let mut directory = Self::new();
        for member in snapshot.members {
            directory.insert(member)?;
        }
        for account in snapshot.bank_accounts {
            directory.insert_bank_account(account);
        }
        Ok(directory)
    }

    pub fn from_json_str(json: &str) -> Result<Self, DirectoryError> {
        let snapshot: DirectorySnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    /// Export the directory, members sorted by referral code.
    pub fn snapshot(&self) -> DirectorySnapshot {
        let mut members: Vec<Member> = self.members.values().cloned().collect();
        members.sort_by(|a, b| a.referral_code.cmp(&b.referral_code));
        let mut bank_accounts: Vec<BankAccount> = self.bank_accounts.values().cloned().collect();
        bank_accounts.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        DirectorySnapshot {
            members,
            bank_accounts,
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl DownlineRepository for InMemoryDirectory {
    fn find_user_by_field(
        &self,
        field: LookupField,
        value: &str,
    ) -> Result<Option<Member>, DirectoryError> {
        let found = match field {
            LookupField::ReferralCode => self.members.get(&ReferralCode::new(value)),
            LookupField::UserId => self
                .by_user_id
                .get(&UserId::new(value))
                .and_then(|code| self.members.get(code)),
            LookupField::Email => self
                .members
                .values()
                .find(|m| !m.email.is_empty() && m.email.eq_ignore_ascii_case(value)),
        };
        Ok(found.cloned())
    }

    fn load_subtree(
        &self,
        root: &ReferralCode,
        depth: u32,
    ) -> Result<HashMap<ReferralCode, Member>, DirectoryError> {
        let mut subtree = HashMap::new();
        let mut queue = VecDeque::new();
        if depth > 0 {
            queue.push_back((root.clone(), 0u32));
        }

        while let Some((code, level)) = queue.pop_front() {
            if subtree.contains_key(&code) {
                continue;
            }
            let Some(member) = self.members.get(&code) else {
                continue;
            };
            if level + 1 < depth {
                for child in member.downlines() {
                    queue.push_back((child.clone(), level + 1));
                }
            }
            subtree.insert(code, member.clone());
        }

        debug!("loaded {} members under {} (depth {})", subtree.len(), root, depth);
        Ok(subtree)
    }

    fn direct_referrals(&self, code: &ReferralCode) -> Result<Vec<Member>, DirectoryError> {
        let mut referrals: Vec<Member> = self
            .members
            .values()
            .filter(|m| m.referred_by.as_ref() == Some(code))
            .cloned()
            .collect();
        referrals.sort_by(|a, b| a.referral_code.cmp(&b.referral_code));
        Ok(referrals)
    }

    fn bank_account(&self, user_id: &UserId) -> Result<Option<BankAccount>, DirectoryError> {
        Ok(self.bank_accounts.get(user_id).cloned())
    }

    fn members(&self) -> Result<Vec<Member>, DirectoryError> {
        let mut members: Vec<Member> = self.members.values().cloned().collect();
        members.sort_by(|a, b| a.referral_code.cmp(&b.referral_code));
        Ok(members)
    }
}
