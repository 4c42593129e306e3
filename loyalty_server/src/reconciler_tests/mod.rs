
mod discoverer;
mod end_to_end;
mod workers;
