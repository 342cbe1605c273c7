pub mod assessment_dto;
