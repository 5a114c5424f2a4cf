pub mod request {
    pub mod destination_index;
    pub mod request;
}

pub mod scheduler {
    pub mod request_queue;
}

pub mod local_elevator {
    pub mod elevator;
    pub mod status;
    pub mod timing;
}

pub mod order_assigner {
    pub mod nearest_elevator;
}

pub mod building {
    pub mod building;
    pub mod registry;
}

pub mod util {
    pub mod config;
    pub mod constants;
    pub mod error;
    pub mod events;
}
