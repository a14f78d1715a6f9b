use crate::model::ErrorObj;

pub fn to_grpc_status(err: &ErrorObj) -> tonic::Status {
    tonic::Status::new(tonic::Code::from_i32(err.grpc_status), err.message_user.clone())
}
