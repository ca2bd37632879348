use grdlhub_shared::account::handle as shared;
use reqwest::{RequestBuilder, Response};

pub struct RequestLink {
    pub email: String,
}

#[async_trait::async_trait]
impl super::Request for RequestLink {
    /// Whether an account already exists for the email.
    type Output = bool;
    const URL_SUFFIX: &'static str = "/api/auth/request-link";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req.json(&shared::RequestLinkDescriptor {
            email: self.email.parse()?,
        }))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        Ok(response
            .json::<shared::RequestLinkResult>()
            .await?
            .account_exists)
    }
}

pub struct Redeem {
    /// The followed sign-in link.
    pub link: String,
    /// Only needed when redeeming on a device other than the one the link
    /// was requested from.
    pub email: Option<String>,
}

#[async_trait::async_trait]
impl super::Request for Redeem {
    type Output = shared::RedeemLinkResult;
    const URL_SUFFIX: &'static str = "/api/auth/redeem";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req.json(&shared::RedeemLinkDescriptor {
            link: self.link.clone(),
            email: match self.email.as_deref() {
                Some(email) => Some(email.parse()?),
                None => None,
            },
        }))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        response.json().await.map_err(From::from)
    }
}

pub struct SelfInfo<'a> {
    pub session: &'a crate::SessionInfo,
}

#[async_trait::async_trait]
impl super::Request for SelfInfo<'_> {
    type Output = shared::SelfInfoResult;
    const URL_SUFFIX: &'static str = "/api/auth/me";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req.headers(self.session.into()))
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        response.json().await.map_err(From::from)
    }
}

pub struct SignOut<'a> {
    pub session: &'a crate::SessionInfo,
}

#[async_trait::async_trait]
impl super::Request for SignOut<'_> {
    type Output = ();
    const URL_SUFFIX: &'static str = "/api/auth/sign-out";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(req.headers(self.session.into()))
    }

    async fn parse_res(&mut self, _response: Response) -> anyhow::Result<Self::Output> {
        Ok(())
    }
}

pub struct Navigation<'a> {
    /// `None` requests the unauthenticated view.
    pub session: Option<&'a crate::SessionInfo>,
}

#[async_trait::async_trait]
impl super::Request for Navigation<'_> {
    type Output = shared::AccessView;
    const URL_SUFFIX: &'static str = "/api/access/navigation";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(match self.session {
            Some(session) => req.headers(session.into()),
            None => req,
        })
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        response.json().await.map_err(From::from)
    }
}

pub struct Dashboard<'a> {
    /// `None` requests the unauthenticated view.
    pub session: Option<&'a crate::SessionInfo>,
}

#[async_trait::async_trait]
impl super::Request for Dashboard<'_> {
    type Output = shared::AccessView;
    const URL_SUFFIX: &'static str = "/api/access/dashboard";

    fn make_req(&self, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        Ok(match self.session {
            Some(session) => req.headers(session.into()),
            None => req,
        })
    }

    async fn parse_res(&mut self, response: Response) -> anyhow::Result<Self::Output> {
        response.json().await.map_err(From::from)
    }
}
