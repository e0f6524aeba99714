use crate::error::RequestError;
use crate::types::{
    CreateRequestInput, HelpRequest, RequestId, RequestStatus, RequestWithRequester,
    UpdateRequestInput, UserId,
};

pub trait RequestRepository {
    fn create(
        &self,
        requester_id: &UserId,
        input: CreateRequestInput,
    ) -> Result<HelpRequest, RequestError>;
    fn get(&self, id: &RequestId) -> Result<Option<HelpRequest>, RequestError>;
    fn get_with_requester(
        &self,
        id: &RequestId,
    ) -> Result<Option<RequestWithRequester>, RequestError>;
    fn list(&self) -> Result<Vec<RequestWithRequester>, RequestError>;
    fn list_by_requester(&self, requester_id: &UserId) -> Result<Vec<HelpRequest>, RequestError>;
    fn update(&self, id: &RequestId, input: UpdateRequestInput)
    -> Result<HelpRequest, RequestError>;
    fn set_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
    ) -> Result<HelpRequest, RequestError>;
    fn delete(&self, id: &RequestId) -> Result<(), RequestError>;
}
