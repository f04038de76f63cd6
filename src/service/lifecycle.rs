//! Asset request lifecycle: submit, approve / reject, return, cancel.
//!
//! Every operation that writes more than one row runs in a single unit of
//! work. Locks are always taken asset first, then request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::{
    error::{AppError, AppResult},
    model::{
        asset::{Asset, AssetType},
        asset_request::{AssetRequest, NewAssetRequest, RequestStatus},
        ledger::NewLedgerEntry,
    },
    store::Store,
};

pub type Clock = fn() -> DateTime<Utc>;

fn asset_not_found(asset_id: u64) -> AppError {
    AppError::not_found(format!("Asset {asset_id} not found"))
}

fn request_not_found(request_id: u64) -> AppError {
    AppError::not_found(format!("Request {request_id} not found"))
}

pub struct RequestLifecycle {
    store: Arc<dyn Store>,
    clock: Clock,
}

impl RequestLifecycle {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Employee claims one unit of an asset held by their HR.
    #[instrument(skip(self, note))]
    pub async fn submit_request(
        &self,
        asset_id: u64,
        requester_email: &str,
        note: Option<String>,
    ) -> AppResult<AssetRequest> {
        let mut uow = self.store.begin().await?;

        let asset = uow
            .lock_asset(asset_id)
            .await?
            .ok_or_else(|| asset_not_found(asset_id))?;
        let requester = uow
            .lock_user(requester_email)
            .await?
            .ok_or_else(|| AppError::forbidden("Unknown requester"))?;

        if requester.hr_email.as_deref() != Some(asset.holder_email.as_str()) {
            return Err(AppError::forbidden("Asset belongs to another company"));
        }
        if asset.quantity == 0 {
            return Err(AppError::conflict(format!("{} is out of stock", asset.name)));
        }
        if !uow.adjust_asset(asset_id, 0, 1).await? {
            return Err(AppError::conflict("Asset counters changed, try again"));
        }

        let new_request = NewAssetRequest {
            asset_id,
            asset_name: asset.name,
            asset_type: asset.asset_type,
            requester_email: requester.email,
            requester_name: requester.name,
            holder_email: asset.holder_email,
            note,
            requested_at: self.now(),
        };
        let request_id = uow.insert_request(&new_request).await?;
        uow.append_ledger(&NewLedgerEntry::from_request(request_id, &new_request))
            .await?;
        uow.commit().await?;

        info!(request_id, asset_id, "Asset requested");
        Ok(new_request.into_request(request_id))
    }

    /// HR hands out one unit: quantity and pending count both drop by one.
    #[instrument(skip(self))]
    pub async fn approve_request(
        &self,
        approver_email: &str,
        asset_id: u64,
        request_id: u64,
    ) -> AppResult<AssetRequest> {
        let mut uow = self.store.begin().await?;

        let asset = uow
            .lock_asset(asset_id)
            .await?
            .ok_or_else(|| asset_not_found(asset_id))?;
        let request = uow
            .lock_request(request_id)
            .await?
            .filter(|r| r.asset_id == asset_id)
            .ok_or_else(|| request_not_found(request_id))?;

        if asset.holder_email != approver_email {
            return Err(AppError::forbidden("Asset is held by another HR"));
        }
        if !request.status.can_transition_to(RequestStatus::Approved) {
            return Err(AppError::conflict(format!(
                "Request {request_id} is already {}",
                request.status
            )));
        }
        if !uow.adjust_asset(asset_id, -1, -1).await? {
            return Err(AppError::conflict(format!(
                "{} has no units left to hand out",
                asset.name
            )));
        }

        let approved_at = self.now();
        if !uow
            .transition_request(
                request_id,
                RequestStatus::Requested,
                RequestStatus::Approved,
                Some(approved_at),
            )
            .await?
        {
            return Err(AppError::conflict(format!(
                "Request {request_id} was processed concurrently"
            )));
        }
        uow.commit().await?;

        info!(request_id, asset_id, "Asset request approved");
        Ok(AssetRequest {
            status: RequestStatus::Approved,
            approved_at: Some(approved_at),
            ..request
        })
    }

    /// Marks the request rejected. Asset counters are left as they are.
    #[instrument(skip(self))]
    pub async fn reject_request(
        &self,
        approver_email: &str,
        request_id: u64,
    ) -> AppResult<AssetRequest> {
        let mut uow = self.store.begin().await?;

        let request = uow
            .lock_request(request_id)
            .await?
            .ok_or_else(|| request_not_found(request_id))?;

        if request.holder_email != approver_email {
            return Err(AppError::forbidden("Request is addressed to another HR"));
        }
        if !request.status.can_transition_to(RequestStatus::Rejected) {
            return Err(AppError::conflict(format!(
                "Request {request_id} is already {}",
                request.status
            )));
        }
        if !uow
            .transition_request(
                request_id,
                RequestStatus::Requested,
                RequestStatus::Rejected,
                None,
            )
            .await?
        {
            return Err(AppError::conflict(format!(
                "Request {request_id} was processed concurrently"
            )));
        }
        uow.commit().await?;

        info!(request_id, "Asset request rejected");
        Ok(AssetRequest {
            status: RequestStatus::Rejected,
            ..request
        })
    }

    /// Employee gives an approved returnable asset back. The request row is
    /// removed; the ledger keeps the history.
    #[instrument(skip(self))]
    pub async fn return_asset(
        &self,
        returner_email: &str,
        request_id: u64,
        asset_id: u64,
    ) -> AppResult<Asset> {
        let mut uow = self.store.begin().await?;

        let asset = uow
            .lock_asset(asset_id)
            .await?
            .ok_or_else(|| asset_not_found(asset_id))?;
        let request = uow
            .lock_request(request_id)
            .await?
            .filter(|r| r.asset_id == asset_id)
            .ok_or_else(|| request_not_found(request_id))?;

        if request.requester_email != returner_email {
            return Err(AppError::forbidden("Request belongs to another employee"));
        }
        if request.status != RequestStatus::Approved {
            return Err(AppError::conflict("Only approved requests can be returned"));
        }
        if asset.asset_type != AssetType::Returnable {
            return Err(AppError::conflict(format!(
                "{} is not returnable",
                asset.name
            )));
        }
        if !uow.adjust_asset(asset_id, 1, 0).await? {
            return Err(AppError::conflict("Asset counters changed, try again"));
        }
        uow.delete_request(request_id).await?;
        uow.commit().await?;

        info!(request_id, asset_id, "Asset returned");
        Ok(Asset {
            quantity: asset.quantity + 1,
            ..asset
        })
    }

    /// Employee withdraws their own request. A request that is still holding
    /// a pending slot (`Requested` or `Rejected`) releases it.
    #[instrument(skip(self))]
    pub async fn cancel_own_request(&self, requester_email: &str, request_id: u64) -> AppResult<()> {
        // Read first to learn the asset so locks follow asset-then-request order.
        let asset_id = self
            .store
            .find_request(request_id)
            .await?
            .ok_or_else(|| request_not_found(request_id))?
            .asset_id;

        let mut uow = self.store.begin().await?;
        let asset = uow.lock_asset(asset_id).await?;
        let request = uow
            .lock_request(request_id)
            .await?
            .ok_or_else(|| request_not_found(request_id))?;

        if request.requester_email != requester_email {
            return Err(AppError::forbidden("Request belongs to another employee"));
        }
        if request.status == RequestStatus::Approved {
            return Err(AppError::conflict(
                "Approved requests must be returned, not cancelled",
            ));
        }

        if asset.is_some() && !uow.adjust_asset(asset_id, 0, -1).await? {
            warn!(request_id, asset_id, "Pending counter already at zero");
        }
        uow.delete_request(request_id).await?;
        uow.commit().await?;

        info!(request_id, asset_id, "Asset request cancelled");
        Ok(())
    }

    /// Visible to the requester and to the HR holding the asset.
    pub async fn get_request(&self, caller_email: &str, request_id: u64) -> AppResult<AssetRequest> {
        let request = self
            .store
            .find_request(request_id)
            .await?
            .ok_or_else(|| request_not_found(request_id))?;

        if request.requester_email != caller_email && request.holder_email != caller_email {
            return Err(AppError::forbidden("Forbidden access"));
        }
        Ok(request)
    }
}
