use grdlhub_shared::account::handle::{manage as shared, SelfInfoResult};
use grdlhub_shared::account::InviteMetadata;
use reqwest::{RequestBuilder, Response};

pub struct AddInvite<'a> {
    pub session: &'a crate::SessionInfo,
    pub email: String,
    pub name: Option<String>,
    pub notes: Option<String>,
}

#[async_trait::async_trait]
impl super::Request for AddInvite<'_> {
    type Output = ();
    const URL_SUFFIX: &'static str = "/api/invite/add";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req
            .headers(self.session.into())
            .json(&shared::AddInviteDescriptor {
                email: self.email.parse()?,
                name: self.name.clone(),
                notes: self.notes.clone(),
            }))
    }

    async fn parse_res(&mut self, _response: Response) -> anyhow::Result<Self::Output> {
        Ok(())
    }
}

pub struct ViewInvites<'a> {
    pub session: &'a crate::SessionInfo,
}

#[async_trait::async_trait]
impl super::Request for ViewInvites<'_> {
    type Output = Vec<InviteMetadata>;
    const URL_SUFFIX: &'static str = "/api/invite/view";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req.headers(self.session.into()))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        response.json().await.map_err(From::from)
    }
}

pub struct ViewAccounts<'a> {
    pub session: &'a crate::SessionInfo,
    pub accounts: Vec<u64>,
}

#[async_trait::async_trait]
impl super::Request for ViewAccounts<'_> {
    type Output = Vec<shared::ViewAccountResult>;
    const URL_SUFFIX: &'static str = "/api/account/manage/view";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req
            .headers(self.session.into())
            .json(&shared::ViewAccountDescriptor {
                accounts: self.accounts.clone(),
            }))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        response.json().await.map_err(From::from)
    }
}

/// Extract the account metadata views from a batch result, dropping the
/// per-id errors.
pub fn ok_accounts(results: Vec<shared::ViewAccountResult>) -> Vec<SelfInfoResult> {
    results
        .into_iter()
        .filter_map(|result| match result {
            shared::ViewAccountResult::Ok(info) => Some(info),
            shared::ViewAccountResult::Err { .. } => None,
        })
        .collect()
}

pub struct ModifyAccount<'a> {
    pub session: &'a crate::SessionInfo,
    pub account_id: u64,
    pub variants: Vec<shared::AccountModifyVariant>,
}

#[async_trait::async_trait]
impl super::Request for ModifyAccount<'_> {
    type Output = ();
    const URL_SUFFIX: &'static str = "/api/account/manage/modify";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req
            .headers(self.session.into())
            .json(&shared::ModifyAccountDescriptor {
                account_id: self.account_id,
                variants: self.variants.clone(),
            }))
    }

    async fn parse_res(&mut self, _response: Response) -> anyhow::Result<Self::Output> {
        Ok(())
    }
}
