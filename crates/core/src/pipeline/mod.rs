pub mod estimate_states_use_case;
pub mod frame_loop;
pub mod locate_faces_use_case;
pub mod pipeline_logger;
