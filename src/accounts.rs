//! User accounts and admin account controls.
//!
//! Registration, bans, profile edits, bonus grants, VIP purchases and
//! player-to-player coin transfers.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audit::AuditAction;
use crate::engine::SettlementEngine;
use crate::error::{Entity, LedgerError, LedgerResult};
use crate::guild::GuildId;
use crate::money::Money;
use crate::storage::LedgerTxn;
use crate::wallet::{BalanceTier, DebitBreakdown, Wallet};

pub type UserId = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Player,
    SuperAdmin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub wallet: Wallet,
    pub is_banned: bool,
    pub ban_reason: Option<String>,
    pub upi_id: Option<String>,
    pub last_device_info: Option<String>,
    pub vip_expiry: Option<DateTime<Utc>>,
    pub guild_id: Option<GuildId>,
    /// Personal replacement for the global daily bet limit
    pub daily_bet_limit_override: Option<Money>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, username: &str, email: &str, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: username.to_string(),
            email: email.to_string(),
            role,
            wallet: Wallet::default(),
            is_banned: false,
            ban_reason: None,
            upi_id: None,
            last_device_info: None,
            vip_expiry: None,
            guild_id: None,
            daily_bet_limit_override: None,
            created_at: now,
        }
    }

    pub fn is_vip_active(&self, now: DateTime<Utc>) -> bool {
        self.vip_expiry.is_some_and(|expiry| expiry > now)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub(crate) fn ensure_not_banned(&self) -> LedgerResult<()> {
        if self.is_banned {
            return Err(LedgerError::precondition(format!(
                "User {} is banned",
                self.username
            )));
        }
        Ok(())
    }

    pub(crate) fn target(&self) -> String {
        format!("User: {} (ID: {})", self.username, self.id)
    }
}

/// What a session sees of a user. Rebuilt from the store after every commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub wallet: Wallet,
    pub total_balance: Money,
    pub is_banned: bool,
    pub vip_expiry: Option<DateTime<Utc>>,
    pub guild_id: Option<GuildId>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            wallet: user.wallet.clone(),
            total_balance: user.wallet.total(),
            is_banned: user.is_banned,
            vip_expiry: user.vip_expiry,
            guild_id: user.guild_id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub upi_id: Option<String>,
}

/// Admin-editable profile fields. Balances are deliberately absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub upi_id: Option<String>,
    pub daily_bet_limit_override: Option<Money>,
    pub clear_daily_bet_limit_override: bool,
}

/// Receipt for coins sent between two players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinTransfer {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub amount: Money,
    /// Tiers the sender paid from. The receiver always gets deposited coins.
    pub breakdown: DebitBreakdown,
    pub transferred_at: DateTime<Utc>,
}

// ============================================================================
// TRANSACTION HELPERS
// ============================================================================

impl LedgerTxn<'_> {
    /// Username of `admin_id`, failing unless the user is a super admin.
    pub(crate) fn admin_name(&self, admin_id: UserId) -> LedgerResult<String> {
        let admin = self.user(admin_id)?;
        if !admin.is_admin() {
            return Err(LedgerError::precondition(format!(
                "{} is not an administrator",
                admin.username
            )));
        }
        Ok(admin.username.clone())
    }

    fn ensure_unique_identity(
        &self,
        username: &str,
        email: &str,
        except: Option<UserId>,
    ) -> LedgerResult<()> {
        for other in self.state.users.values() {
            if Some(other.id) == except {
                continue;
            }
            if other.username.eq_ignore_ascii_case(username) {
                return Err(LedgerError::DuplicateAction("Username is already taken.".into()));
            }
            if other.email.eq_ignore_ascii_case(email) {
                return Err(LedgerError::DuplicateAction("Email is already registered.".into()));
            }
        }
        Ok(())
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

impl SettlementEngine {
    pub fn register_user(&self, new: NewUser) -> LedgerResult<UserView> {
        let username = new.username.trim().to_string();
        let email = new.email.trim().to_string();
        if username.is_empty() || email.is_empty() {
            return Err(LedgerError::precondition("Username and email are required"));
        }

        let view = self.transact(|tx| {
            tx.ensure_unique_identity(&username, &email, None)?;
            let id = tx.next_id();
            let mut user = User::new(id, &username, &email, new.role, tx.now());
            user.upi_id = new.upi_id;
            let view = UserView::from(&user);
            tx.insert_user(user);
            Ok(view)
        })?;

        info!(user_id = view.id, username = %view.username, role = ?view.role, "👤 User registered");
        Ok(view)
    }

    /// Remember the device a user last signed in from. Joins capture it.
    pub fn record_device(&self, user_id: UserId, device_info: &str) -> LedgerResult<()> {
        self.transact(|tx| {
            tx.user_mut(user_id)?.last_device_info = Some(device_info.to_string());
            Ok(())
        })
    }

    pub fn set_ban(
        &self,
        admin_id: UserId,
        user_id: UserId,
        banned: bool,
        reason: Option<String>,
    ) -> LedgerResult<UserView> {
        let view = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let user = tx.user_mut(user_id)?;
            user.is_banned = banned;
            user.ban_reason = if banned { reason } else { None };
            let target = user.target();
            let view = UserView::from(&*user);

            let action = if banned { AuditAction::UserBanned } else { AuditAction::UserUnbanned };
            tx.audit(&actor, action, target);
            Ok(view)
        })?;

        if banned {
            warn!(user_id, admin_id, "🚫 User banned");
        } else {
            info!(user_id, admin_id, "User unbanned");
        }
        Ok(view)
    }

    pub fn update_user(&self, admin_id: UserId, user_id: UserId, patch: UserPatch) -> LedgerResult<UserView> {
        if let Some(limit) = patch.daily_bet_limit_override {
            if limit < Money::ZERO {
                return Err(LedgerError::InvalidAmount(limit));
            }
        }

        let view = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let current = tx.user(user_id)?;
            let username = patch
                .username
                .as_deref()
                .map(str::trim)
                .unwrap_or(&current.username)
                .to_string();
            let email = patch
                .email
                .as_deref()
                .map(str::trim)
                .unwrap_or(&current.email)
                .to_string();
            if username.is_empty() || email.is_empty() {
                return Err(LedgerError::precondition("Username and email are required"));
            }
            tx.ensure_unique_identity(&username, &email, Some(user_id))?;

            let user = tx.user_mut(user_id)?;
            user.username = username;
            user.email = email;
            if let Some(upi) = patch.upi_id {
                user.upi_id = Some(upi);
            }
            if patch.clear_daily_bet_limit_override {
                user.daily_bet_limit_override = None;
            } else if let Some(limit) = patch.daily_bet_limit_override {
                user.daily_bet_limit_override = Some(limit);
            }
            let target = user.target();
            let view = UserView::from(&*user);

            tx.audit(&actor, AuditAction::UserEdited, target);
            Ok(view)
        })?;

        info!(user_id, admin_id, "✏️ User edited");
        Ok(view)
    }

    /// Admin credit to the bonus tier.
    pub fn grant_bonus(&self, admin_id: UserId, user_id: UserId, amount: Money) -> LedgerResult<Wallet> {
        let wallet = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            tx.credit(user_id, BalanceTier::Bonus, amount)?;
            let user = tx.user(user_id)?;
            let target = format!("{}, Amount: ₹{}", user.target(), amount);
            let wallet = user.wallet.clone();

            tx.audit(&actor, AuditAction::BonusGranted, target);
            Ok(wallet)
        })?;

        info!(user_id, admin_id, amount = %amount, "🎁 Bonus granted");
        Ok(wallet)
    }

    /// Buy a VIP plan. Returns the new expiry, which replaces any existing one.
    pub fn buy_vip(&self, user_id: UserId, plan_id: &str) -> LedgerResult<DateTime<Utc>> {
        let plan = self
            .config()
            .vip_plan(plan_id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFoundNamed(Entity::VipPlan, plan_id.to_string()))?;

        let expiry = self.transact(|tx| {
            let now = tx.now();
            tx.debit(user_id, plan.price)?;
            let expiry = now + Duration::days(plan.duration_days);
            tx.user_mut(user_id)?.vip_expiry = Some(expiry);
            Ok(expiry)
        })?;

        info!(user_id, plan = %plan.id, price = %plan.price, expiry = %expiry, "👑 VIP purchased");
        Ok(expiry)
    }

    /// Move coins from one player to another in a single transaction.
    ///
    /// The sender pays in debit priority order; the receiver is credited to
    /// the deposited tier, so gifted coins are not directly withdrawable.
    pub fn transfer_coins(&self, sender_id: UserId, receiver_id: UserId, amount: Money) -> LedgerResult<CoinTransfer> {
        let transfer = self.transact(|tx| {
            if amount <= Decimal::ZERO {
                return Err(LedgerError::InvalidAmount(amount));
            }
            let sender = tx.user(sender_id)?;
            tx.user(receiver_id)?;
            if sender_id == receiver_id {
                return Err(LedgerError::precondition("Cannot send coins to yourself."));
            }
            sender.ensure_not_banned()?;

            let breakdown = tx.debit(sender_id, amount)?;
            tx.credit(receiver_id, BalanceTier::Deposited, amount)?;
            Ok(CoinTransfer {
                sender_id,
                receiver_id,
                amount,
                breakdown,
                transferred_at: tx.now(),
            })
        })?;

        info!(sender_id, receiver_id, amount = %amount, "💸 Coins transferred");
        Ok(transfer)
    }

    pub fn user(&self, user_id: UserId) -> LedgerResult<User> {
        self.store().read(|s| s.user(user_id).cloned())
    }

    pub fn find_user_by_name(&self, username: &str) -> Option<User> {
        self.store().read(|s| {
            s.users
                .values()
                .find(|u| u.username.eq_ignore_ascii_case(username))
                .cloned()
        })
    }
}
